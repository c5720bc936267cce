pub mod authority;
pub mod client;
pub mod messages;
pub mod roster;

pub use authority::{LinkService, LinkState};

use anyhow::Result;

/// The 9 player-facing messages, indexed by LNK_* constants.
#[derive(Debug, Clone)]
pub struct LinkMessages(pub [String; 9]);

// Message key indices
pub const LNK_ALREADY:    usize = 0;
pub const LNK_CODEUSED:   usize = 1;
pub const LNK_SUCCESS:    usize = 2;
pub const LNK_INVALID:    usize = 3;
pub const LNK_RESETOK:    usize = 4;
pub const LNK_RESETFAIL:  usize = 5;
pub const LNK_CLEAROK:    usize = 6;
pub const LNK_CLEARFAIL:  usize = 7;
pub const LNK_NOSTORAGE:  usize = 8;

impl Default for LinkMessages {
    fn default() -> Self {
        Self([
            "You've already been verified!".to_string(),
            "That code has already been used. Request a new one.".to_string(),
            "Verification successful! Welcome!".to_string(),
            "Invalid code! Please check and try again.".to_string(),
            "Your verification status has been reset!".to_string(),
            "Failed to reset status.".to_string(),
            "Cleared {count} used codes!".to_string(),
            "Failed to clear codes.".to_string(),
            "Storage unavailable.".to_string(),
        ])
    }
}

/// Parses a `key: value` lang file. Lines starting with `//` are
/// comments. Unknown keys are silently ignored; unset keys keep their
/// built-in wording.
pub fn parse_lang_file(content: &str) -> Result<LinkMessages> {
    let mut msgs = LinkMessages::default();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("//") || line.is_empty() {
            continue;
        }
        if let Some((key, val)) = line.split_once(':') {
            let val = val.trim().to_string();
            match key.trim().to_ascii_uppercase().as_str() {
                "LNK_ALREADY"   => msgs.0[LNK_ALREADY]   = val,
                "LNK_CODEUSED"  => msgs.0[LNK_CODEUSED]  = val,
                "LNK_SUCCESS"   => msgs.0[LNK_SUCCESS]   = val,
                "LNK_INVALID"   => msgs.0[LNK_INVALID]   = val,
                "LNK_RESETOK"   => msgs.0[LNK_RESETOK]   = val,
                "LNK_RESETFAIL" => msgs.0[LNK_RESETFAIL] = val,
                "LNK_CLEAROK"   => msgs.0[LNK_CLEAROK]   = val,
                "LNK_CLEARFAIL" => msgs.0[LNK_CLEARFAIL] = val,
                "LNK_NOSTORAGE" => msgs.0[LNK_NOSTORAGE] = val,
                _ => {}
            }
        }
    }
    Ok(msgs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
// Link server lang file
LNK_ALREADY: Ya has sido verificado!
LNK_INVALID: Codigo invalido.
"#;

    #[test]
    fn test_parse_lang_file_overrides() {
        let msgs = parse_lang_file(FIXTURE).unwrap();
        assert_eq!(msgs.0[LNK_ALREADY], "Ya has sido verificado!");
        assert_eq!(msgs.0[LNK_INVALID], "Codigo invalido.");
        // untouched keys keep defaults
        assert_eq!(msgs.0[LNK_SUCCESS], "Verification successful! Welcome!");
    }

    #[test]
    fn test_parse_lang_file_ignores_comments_and_unknown() {
        let msgs = parse_lang_file("// comment\nLNK_BOGUS: x\n").unwrap();
        assert_eq!(msgs.0[LNK_ALREADY], "You've already been verified!");
    }

    #[test]
    fn test_clear_message_has_count_placeholder() {
        let msgs = LinkMessages::default();
        assert!(msgs.0[LNK_CLEAROK].contains("{count}"));
    }
}
