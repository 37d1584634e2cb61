use std::fmt;
use std::str::FromStr;

/// Display skin stored in the ephemeral slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Skin {
    /// Light theme.
    #[default]
    Shallow,
    /// Dark theme.
    Deep,
}

impl Skin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Skin::Shallow => "shallow",
            Skin::Deep => "deep",
        }
    }

    /// Path of the stylesheet applied for this skin.
    pub fn stylesheet(&self) -> String {
        format!("/assets/{}.css", self.as_str())
    }
}

impl fmt::Display for Skin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Skin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shallow" | "light" => Ok(Skin::Shallow),
            "deep" | "dark" => Ok(Skin::Deep),
            other => Err(format!("Unknown skin: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skin_parse() {
        assert_eq!("deep".parse::<Skin>().unwrap(), Skin::Deep);
        assert_eq!("Dark".parse::<Skin>().unwrap(), Skin::Deep);
        assert_eq!("shallow".parse::<Skin>().unwrap(), Skin::Shallow);
        assert!("neon".parse::<Skin>().is_err());
    }

    #[test]
    fn test_skin_stylesheet() {
        assert_eq!(Skin::default().stylesheet(), "/assets/shallow.css");
        assert_eq!(Skin::Deep.stylesheet(), "/assets/deep.css");
    }
}
