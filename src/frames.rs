//! Named spinner frame sets.
//!
//! Any non-empty sequence of strings works as an animation; these are the
//! presets shipped with the crate. [`DOTS7`] is the default for
//! [`ProgressInstance::new`](crate::ProgressInstance::new).
//!
//! ```rust,ignore
//! let frames = frames::named("line").unwrap();
//! let task = ProgressInstance::builder("compile").frames(frames.iter().copied()).build()?;
//! ```

use std::sync::OnceLock;

use indexmap::IndexMap;

/// Braille dots falling into a pile.
pub const DOTS7: &[&str] = &[
    "⠈⠁", "⠈⠑", "⠈⠱", "⠈⡱", "⢀⡱", "⢄⡱", "⢄⡱", "⢆⡱", "⢎⡱", "⢎⡰", "⢎⡠", "⢎⡀", "⢎⠁", "⠎⠁", "⠊⠁",
];

/// Braille dot spinner (the most common choice).
pub const DOTS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Classic line spinner.
pub const LINE: &[&str] = &["-", "\\", "|", "/"];

/// Arrow spinner.
pub const ARROW: &[&str] = &["←", "↖", "↑", "↗", "→", "↘", "↓", "↙"];

pub const BOUNCING_BAR: &[&str] = &[
    "[    ]", "[=   ]", "[==  ]", "[=== ]", "[ ===]", "[  ==]", "[   =]", "[    ]", "[   =]",
    "[  ==]", "[ ===]", "[====]", "[=== ]", "[==  ]", "[=   ]",
];

fn table() -> &'static IndexMap<&'static str, &'static [&'static str]> {
    static TABLE: OnceLock<IndexMap<&'static str, &'static [&'static str]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        IndexMap::from([
            ("dots7", DOTS7),
            ("dots", DOTS),
            ("line", LINE),
            ("arrow", ARROW),
            ("bouncingBar", BOUNCING_BAR),
        ])
    })
}

/// Looks up a preset by name.
pub fn named(name: &str) -> Option<&'static [&'static str]> {
    table().get(name).copied()
}

/// Preset names in declaration order.
pub fn names() -> impl Iterator<Item = &'static str> {
    table().keys().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_non_empty() {
        for name in names() {
            assert!(!named(name).unwrap().is_empty(), "{name} has no frames");
        }
    }

    #[test]
    fn lookup_preserves_declaration_order() {
        let names: Vec<_> = names().collect();
        assert_eq!(names, ["dots7", "dots", "line", "arrow", "bouncingBar"]);
        assert_eq!(named("line"), Some(LINE));
        assert_eq!(named("nope"), None);
    }
}
