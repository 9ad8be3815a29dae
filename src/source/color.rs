use serde::Deserialize;

/// Straight-alpha RGBA8 color as written in layer params.
///
/// Accepts `"#RRGGBB"`, `"#RRGGBBAA"`, `"#RGB"`, or an `[r, g, b]` / `[r, g, b, a]` array of
/// 0-255 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    /// Opaque white.
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    /// Parse a hex color string.
    pub fn parse_hex(s: &str) -> Result<Self, String> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> Result<u8, String> {
            u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
        }

        if !s.is_ascii() {
            return Err("hex color must be ASCII".to_owned());
        }
        match s.len() {
            3 => {
                let mut out = [255u8; 4];
                for (i, c) in s.chars().enumerate() {
                    let v = hex_byte(&c.to_string())?;
                    out[i] = v * 17;
                }
                Ok(Self(out))
            }
            6 | 8 => {
                let mut out = [255u8; 4];
                for i in 0..s.len() / 2 {
                    out[i] = hex_byte(&s[i * 2..i * 2 + 2])?;
                }
                Ok(Self(out))
            }
            _ => Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
        }
    }

    /// Linear interpolation between two colors, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut out = [0u8; 4];
        for (i, o) in out.iter_mut().enumerate() {
            let a = f64::from(self.0[i]);
            let b = f64::from(other.0[i]);
            *o = (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
        }
        Self(out)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => Self::parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self([*r, *g, *b, 255])),
                [r, g, b, a] => Ok(Self([*r, *g, *b, *a])),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/color.rs"]
mod tests;
