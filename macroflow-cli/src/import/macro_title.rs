//! Macro identity extraction from a sheet's title cell

use once_cell::sync::Lazy;
use regex::Regex;

use crate::workbook::Sheet;

/// Cell holding the macro title (row, column)
pub const TITLE_CELL: (usize, usize) = (0, 0);
/// Cell holding the long macro description (row, column)
pub const DESCRIPTION_CELL: (usize, usize) = (3, 0);

/// Characters kept in the short description before truncation
pub const SHORT_DESCRIPTION_CHARS: usize = 100;

/// Characters of the sheet name used for a fallback code
const SHEET_CODE_CHARS: usize = 10;

/// Code and display name of a macro
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroIdentity {
    pub code: String,
    pub name: String,
}

/// Ways of deriving a macro identity, tried in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleStrategy {
    /// "Macro 03: Network Security" style titles
    TitlePattern,
    /// Code from the start of the sheet name, full sheet name as display name
    SheetName,
}

pub const TITLE_STRATEGIES: [TitleStrategy; 2] = [
    TitleStrategy::TitlePattern,
    TitleStrategy::SheetName,
];

impl TitleStrategy {
    pub fn extract(&self, title: &str, sheet_name: &str) -> Option<MacroIdentity> {
        match self {
            TitleStrategy::TitlePattern => parse_macro_title(title),
            TitleStrategy::SheetName => {
                let prefix: String = sheet_name.chars().take(SHEET_CODE_CHARS).collect();
                Some(MacroIdentity {
                    code: strip_whitespace(&prefix),
                    name: sheet_name.to_string(),
                })
            }
        }
    }
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

static MACRO_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(Macro\s*\d+)\s*[:|-]\s*(.*)")
        .expect("macro title pattern is valid")
});

/// Parse "Macro <number><sep><name>" anywhere in the title
/// e.g. "Macro 03: Network Security" -> ("Macro03", "Network Security")
fn parse_macro_title(title: &str) -> Option<MacroIdentity> {
    let caps = MACRO_TITLE.captures(title)?;

    Some(MacroIdentity {
        code: strip_whitespace(caps.get(1)?.as_str()),
        name: caps.get(2)?.as_str().trim().to_string(),
    })
}

/// Resolve the identity with the first strategy that succeeds
pub fn extract_identity(title: &str, sheet_name: &str) -> MacroIdentity {
    TITLE_STRATEGIES
        .iter()
        .find_map(|strategy| strategy.extract(title, sheet_name))
        .unwrap_or_else(|| MacroIdentity {
            code: strip_whitespace(sheet_name),
            name: sheet_name.to_string(),
        })
}

/// Truncate to [`SHORT_DESCRIPTION_CHARS`] characters, marking the cut with "..."
pub fn short_description(description: &str) -> String {
    if description.chars().count() > SHORT_DESCRIPTION_CHARS {
        let head: String = description.chars().take(SHORT_DESCRIPTION_CHARS).collect();
        format!("{}...", head)
    } else {
        description.to_string()
    }
}

/// Everything the importer needs to write a macro record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDraft {
    pub identity: MacroIdentity,
    pub description: String,
    pub short_description: String,
}

/// Read the macro title and description cells of a sheet
pub fn extract_macro(sheet: &Sheet) -> MacroDraft {
    let title = sheet.text_lossy(TITLE_CELL.0, TITLE_CELL.1);
    let identity = extract_identity(&title, &sheet.name);

    let description = if sheet.height() > DESCRIPTION_CELL.0 {
        sheet.text_lossy(DESCRIPTION_CELL.0, DESCRIPTION_CELL.1)
    } else {
        String::new()
    };

    MacroDraft {
        identity,
        short_description: short_description(&description),
        description,
    }
}
