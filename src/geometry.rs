//! Geometry descriptor parsing.
//!
//! Parses compact descriptors such as `200x300^`, `100x100#c` or
//! `128x128+64+64` into a [`GeometryDescriptor`].
//!
//! ```text
//! [W]x[H]{!^<>}*[#[gravity]][(+|-)X(+|-)Y]
//! ```
//!
//! A width or height of `0` is the same as leaving it out. Anything after the
//! last recognized token is an error, never silently dropped.
//!
//! # Example
//!
//! ```
//! use geomspec::{GeometryDescriptor, Gravity, Modifier};
//!
//! let geom = GeometryDescriptor::parse("100x127#ne").unwrap();
//! assert_eq!(geom.width, Some(100));
//! assert_eq!(geom.height, Some(127));
//! assert!(geom.modifiers.contains(Modifier::CropToFit));
//! assert_eq!(geom.gravity, Some(Gravity::NorthEast));
//! assert_eq!(geom.to_string(), "100x127#ne");
//! ```

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use crate::error::{GeometryError, InvalidReason};

/// A single trailing modifier character.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// `!`: scale each axis to the exact request.
    IgnoreAspectRatio,
    /// `^`: cover the requested rectangle.
    FillArea,
    /// `<`: leave the image alone if it is larger than requested on every axis.
    NoUpscale,
    /// `>`: leave the image alone if it is smaller than requested on every axis.
    NoDownscale,
    /// `#`: resize to cover, then crop at a gravity anchor.
    CropToFit,
}

impl Modifier {
    const ALL: [Modifier; 5] = [
        Modifier::IgnoreAspectRatio,
        Modifier::FillArea,
        Modifier::NoUpscale,
        Modifier::NoDownscale,
        Modifier::CropToFit,
    ];

    /// The descriptor character for this modifier.
    pub const fn as_char(self) -> char {
        match self {
            Self::IgnoreAspectRatio => '!',
            Self::FillArea => '^',
            Self::NoUpscale => '<',
            Self::NoDownscale => '>',
            Self::CropToFit => '#',
        }
    }

    /// Inverse of [`as_char`](Self::as_char).
    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_char() == c)
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of [`Modifier`]s. Repeats collapse.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifiers(u8);

impl Modifiers {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Whether `m` is in the set.
    pub fn contains(self, m: Modifier) -> bool {
        self.0 & m.bit() != 0
    }

    /// Add `m`. Inserting twice is a no-op.
    pub fn insert(&mut self, m: Modifier) {
        self.0 |= m.bit();
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, m: Modifier) -> Self {
        self.insert(m);
        self
    }

    /// Whether no modifier is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in descriptor order: `! ^ < > #`.
    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        Modifier::ALL.into_iter().filter(move |m| self.contains(*m))
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Position of a crop window along one axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Anchor1D {
    /// Left or top edge.
    Near,
    /// Midpoint.
    Center,
    /// Right or bottom edge.
    Far,
}

impl Anchor1D {
    /// Offset of a window inside `space` spare pixels.
    pub(crate) fn offset(self, space: f64) -> f64 {
        match self {
            Self::Near => 0.0,
            Self::Center => space / 2.0,
            Self::Far => space,
        }
    }
}

/// Compass anchor for a `#` crop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Gravity {
    Center,
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Gravity {
    /// Parse a gravity code (`c`, `n`, `s`, `e`, `w`, `ne`, `nw`, `se`, `sw`).
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "c" => Self::Center,
            "n" => Self::North,
            "s" => Self::South,
            "e" => Self::East,
            "w" => Self::West,
            "ne" => Self::NorthEast,
            "nw" => Self::NorthWest,
            "se" => Self::SouthEast,
            "sw" => Self::SouthWest,
            _ => return None,
        })
    }

    /// The descriptor code, inverse of [`from_code`](Self::from_code).
    pub const fn code(self) -> &'static str {
        match self {
            Self::Center => "c",
            Self::North => "n",
            Self::South => "s",
            Self::East => "e",
            Self::West => "w",
            Self::NorthEast => "ne",
            Self::NorthWest => "nw",
            Self::SouthEast => "se",
            Self::SouthWest => "sw",
        }
    }

    /// `(horizontal, vertical)` anchors.
    pub const fn anchors(self) -> (Anchor1D, Anchor1D) {
        use Anchor1D::*;
        match self {
            Self::Center => (Center, Center),
            Self::North => (Center, Near),
            Self::South => (Center, Far),
            Self::East => (Far, Center),
            Self::West => (Near, Center),
            Self::NorthEast => (Far, Near),
            Self::NorthWest => (Near, Near),
            Self::SouthEast => (Far, Far),
            Self::SouthWest => (Near, Far),
        }
    }
}

/// Parsed geometry descriptor.
///
/// `width`/`height` are `None` when absent or zero. `gravity` and `offset`
/// are never both set on a descriptor that passed validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct GeometryDescriptor {
    /// Requested width in pixels.
    pub width: Option<u32>,
    /// Requested height in pixels.
    pub height: Option<u32>,
    /// Trailing modifier characters.
    pub modifiers: Modifiers,
    /// Crop anchor following `#`.
    pub gravity: Option<Gravity>,
    /// Explicit crop origin from `+X+Y`.
    pub offset: Option<(i32, i32)>,
}

impl GeometryDescriptor {
    /// Descriptor with both dimensions. Zero means "absent".
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: positive(width),
            height: positive(height),
            modifiers: Modifiers::empty(),
            gravity: None,
            offset: None,
        }
    }

    /// `Wx`: height derived from the source aspect ratio.
    pub fn width_only(width: u32) -> Self {
        Self::new(width, 0)
    }

    /// `xH`: width derived from the source aspect ratio.
    pub fn height_only(height: u32) -> Self {
        Self::new(0, height)
    }

    /// Add a modifier.
    pub fn modifier(mut self, m: Modifier) -> Self {
        self.modifiers.insert(m);
        self
    }

    /// Set the crop gravity. Implies [`Modifier::CropToFit`].
    pub fn gravity(mut self, gravity: Gravity) -> Self {
        self.modifiers.insert(Modifier::CropToFit);
        self.gravity = Some(gravity);
        self
    }

    /// Set an explicit crop origin, as `+X+Y` does.
    pub fn offset(mut self, x: i32, y: i32) -> Self {
        self.offset = Some((x, y));
        self
    }

    /// Shorthand for `self.modifiers.contains(m)`.
    pub fn has(&self, m: Modifier) -> bool {
        self.modifiers.contains(m)
    }

    /// Parse a descriptor string.
    pub fn parse(descriptor: &str) -> Result<Self, GeometryError> {
        let geom = Parser::new(descriptor)
            .descriptor()
            .and_then(|g| g.check().map(|()| g))
            .map_err(|reason| GeometryError::invalid(descriptor, reason))?;
        tracing::trace!(descriptor, ?geom, "parsed geometry");
        Ok(geom)
    }

    /// Check the cross-field rules the grammar alone cannot express.
    pub fn validate(&self) -> Result<(), GeometryError> {
        self.check()
            .map_err(|reason| GeometryError::invalid(alloc::format!("{self}"), reason))
    }

    fn check(&self) -> Result<(), InvalidReason> {
        let both = self.width.is_some() && self.height.is_some();
        if self.width.is_none() && self.height.is_none() {
            return Err(InvalidReason::NoDimensions);
        }
        if self.gravity.is_some() && self.offset.is_some() {
            return Err(InvalidReason::ConflictingCrop);
        }
        let needs_both = self.offset.is_some()
            || self.gravity.is_some()
            || self.has(Modifier::IgnoreAspectRatio)
            || self.has(Modifier::FillArea);
        if needs_both && !both {
            return Err(InvalidReason::MissingDimension);
        }
        Ok(())
    }
}

impl FromStr for GeometryDescriptor {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for GeometryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(w) = self.width {
            write!(f, "{w}")?;
        }
        f.write_str("x")?;
        if let Some(h) = self.height {
            write!(f, "{h}")?;
        }
        for m in self.modifiers.iter() {
            write!(f, "{}", m.as_char())?;
        }
        if let Some(g) = self.gravity {
            f.write_str(g.code())?;
        }
        if let Some((x, y)) = self.offset {
            write!(f, "{x:+}{y:+}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for GeometryDescriptor {
    type Error = GeometryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<GeometryDescriptor> for String {
    fn from(g: GeometryDescriptor) -> Self {
        alloc::format!("{g}")
    }
}

fn positive(v: u32) -> Option<u32> {
    (v > 0).then_some(v)
}

// ---- Tokenizer ----

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn descriptor(mut self) -> Result<GeometryDescriptor, InvalidReason> {
        let width = self.digits()?;
        match self.peek() {
            Some(b'x' | b'X') => self.pos += 1,
            None => return Err(InvalidReason::MissingSeparator),
            Some(_) => return Err(self.unexpected()),
        }
        let height = self.digits()?;

        let mut modifiers = Modifiers::empty();
        while let Some(m) = self
            .peek()
            .filter(|&b| b != b'#')
            .and_then(|b| Modifier::from_char(b as char))
        {
            modifiers.insert(m);
            self.pos += 1;
        }

        let mut gravity = None;
        if self.peek() == Some(b'#') {
            self.pos += 1;
            modifiers.insert(Modifier::CropToFit);
            let code = self.letters();
            if !code.is_empty() {
                gravity = Some(Gravity::from_code(code).ok_or(InvalidReason::UnknownGravity)?);
            }
        }

        let offset = match self.peek() {
            Some(b'+' | b'-') => Some((self.signed()?, self.signed()?)),
            _ => None,
        };

        if self.pos < self.src.len() {
            return Err(self.unexpected());
        }

        Ok(GeometryDescriptor {
            width: width.and_then(positive),
            height: height.and_then(positive),
            modifiers,
            gravity,
            offset,
        })
    }

    /// Optional run of decimal digits.
    fn digits(&mut self) -> Result<Option<u32>, InvalidReason> {
        let run = self.take_while(|b| b.is_ascii_digit());
        if run.is_empty() {
            return Ok(None);
        }
        run.parse::<u32>()
            .map(Some)
            .map_err(|_| InvalidReason::NumberOutOfRange)
    }

    /// Mandatory `+N` or `-N`.
    fn signed(&mut self) -> Result<i32, InvalidReason> {
        let start = self.pos;
        match self.peek() {
            Some(b'+' | b'-') => self.pos += 1,
            _ => return Err(InvalidReason::MalformedOffset),
        }
        if self.take_while(|b| b.is_ascii_digit()).is_empty() {
            return Err(InvalidReason::MalformedOffset);
        }
        self.src[start..self.pos]
            .parse::<i32>()
            .map_err(|_| InvalidReason::NumberOutOfRange)
    }

    fn letters(&mut self) -> &'a str {
        self.take_while(|b| b.is_ascii_alphabetic())
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn unexpected(&self) -> InvalidReason {
        // pos always sits on a char boundary: only ASCII bytes are consumed.
        let c = self.src[self.pos..].chars().next().unwrap_or('\0');
        InvalidReason::UnexpectedChar(c)
    }
}
