//! Register-name definition files.
//!
//! Device headers list one `NAME EQU H'hex'` definition per line. Everything
//! else (banners, `LIST`, `IFNDEF`, `__MAXRAM`, `__BADRAM`, config macros)
//! is skipped.

use std::fs;
use std::path::Path;

use pic14_core::RegisterMap;
use tracing::debug;

use crate::errors::IncludeError;
use crate::parser::{is_identifier, parse_number, strip_comment};

/// Parses definition text into a name map.
///
/// # Errors
///
/// [`IncludeError::Syntax`] when an `EQU` line carries a malformed or
/// out-of-range value.
pub fn parse_include(text: &str) -> Result<RegisterMap, IncludeError> {
    let mut names = RegisterMap::new();
    for (index, raw) in text.lines().enumerate() {
        let mut tokens = strip_comment(raw).split_whitespace();
        let (Some(name), Some(keyword), Some(value)) = (tokens.next(), tokens.next(), tokens.next())
        else {
            continue;
        };
        if !keyword.eq_ignore_ascii_case("EQU") || !is_identifier(name) {
            continue;
        }
        let number = parse_number(value)
            .and_then(|number| u16::try_from(number).ok())
            .ok_or_else(|| IncludeError::Syntax {
                line: index + 1,
                message: format!("`{value}` is not a valid value for {name}"),
            })?;
        names.insert(name, number);
    }
    debug!(names = names.len(), "parsed register names");
    Ok(names)
}

/// Reads and parses a definition file.
///
/// # Errors
///
/// I/O failures and [`parse_include`] errors.
pub fn load_include(path: &Path) -> Result<RegisterMap, IncludeError> {
    parse_include(&fs::read_to_string(path)?)
}

/// Core register names overlaid with the definitions from `path`, if any.
///
/// # Errors
///
/// See [`load_include`].
pub fn register_names(path: Option<&Path>) -> Result<RegisterMap, IncludeError> {
    let mut names = RegisterMap::core_registers();
    if let Some(path) = path {
        names.extend(
            load_include(path)?
                .iter()
                .map(|(name, value)| (name.to_owned(), value)),
        );
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{load_include, parse_include, register_names};
    use crate::errors::IncludeError;

    const HEADER: &str = "
        LIST
; P16F1826 Standard Header File
        NOLIST

;----- Register Files -----
INDF0            EQU  H'0000'
STATUS           EQU  H'0003'
trisb            EQU  H'008D'   ; bank 1
;----- STATUS Bits -----
C                EQU  H'0000'
Z                EQU  H'0002'
        __MAXRAM  H'FFF'
        __BADRAM  H'0E'
        IFNDEF __16F1826
";

    #[test]
    fn reads_equ_lines_and_skips_directives() {
        let names = parse_include(HEADER).expect("parses");
        assert_eq!(names.len(), 5);
        assert_eq!(names.get("TRISB"), Some(0x8D));
        assert_eq!(names.get("status"), Some(3));
        assert_eq!(names.get("Z"), Some(2));
        assert_eq!(names.get("__MAXRAM"), None);
    }

    #[test]
    fn bad_value_reports_its_line() {
        let error = parse_include("A EQU H'00'\nB EQU H'zz'\n").expect_err("bad value");
        assert!(matches!(error, IncludeError::Syntax { line: 2, .. }));
    }

    #[test]
    fn file_definitions_overlay_core_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("device.inc");
        fs::write(&path, "PORTC EQU H'000E'\nSTATUS EQU H'0083'\n").expect("write");

        assert_eq!(load_include(&path).expect("loads").len(), 2);
        let names = register_names(Some(&path)).expect("loads");
        assert_eq!(names.get("PORTC"), Some(0x0E));
        assert_eq!(names.get("STATUS"), Some(0x83));
        assert_eq!(names.get("WREG"), Some(0x09));
        assert!(register_names(Some(&dir.path().join("missing.inc"))).is_err());
    }
}
