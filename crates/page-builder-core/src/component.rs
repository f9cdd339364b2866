//! Page components and their typed properties.
//!
//! A component's properties are a tagged union: each `Block` variant carries
//! its own props struct. In JSON a block is `{"type": "...", "props": {...}}`.
//! Unknown types and unknown property keys are rejected when parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::new_id;
use crate::error::EditError;

/// A component placed on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Component {
    pub id: String,
    /// Hidden components stay in the document but are not rendered.
    #[serde(default)]
    pub hidden: bool,
    pub block: Block,
}

impl Component {
    /// Creates a visible component with a fresh id.
    pub fn new(block: Block) -> Self {
        Self {
            id: new_id("cmp"),
            hidden: false,
            block,
        }
    }

    /// A copy of this component under a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: new_id("cmp"),
            hidden: self.hidden,
            block: self.block.clone(),
        }
    }
}

/// Typed component content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "props", rename_all = "kebab-case")]
pub enum Block {
    Hero(HeroProps),
    Text(TextProps),
    Image(ImageProps),
    Button(ButtonProps),
    CourseGrid(CourseGridProps),
    Testimonial(TestimonialProps),
    Spacer(SpacerProps),
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Hero(_) => BlockKind::Hero,
            Block::Text(_) => BlockKind::Text,
            Block::Image(_) => BlockKind::Image,
            Block::Button(_) => BlockKind::Button,
            Block::CourseGrid(_) => BlockKind::CourseGrid,
            Block::Testimonial(_) => BlockKind::Testimonial,
            Block::Spacer(_) => BlockKind::Spacer,
        }
    }

    /// A block of the given kind with default properties.
    pub fn default_for(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Hero => Block::Hero(HeroProps::default()),
            BlockKind::Text => Block::Text(TextProps::default()),
            BlockKind::Image => Block::Image(ImageProps::default()),
            BlockKind::Button => Block::Button(ButtonProps::default()),
            BlockKind::CourseGrid => Block::CourseGrid(CourseGridProps::default()),
            BlockKind::Testimonial => Block::Testimonial(TestimonialProps::default()),
            BlockKind::Spacer => Block::Spacer(SpacerProps::default()),
        }
    }

    /// One-line description for listings.
    pub fn summary(&self) -> String {
        match self {
            Block::Hero(p) => p.heading.clone(),
            Block::Text(p) => {
                let first_line = p.body.lines().next().unwrap_or_default();
                truncate(first_line, 40)
            }
            Block::Image(p) => {
                if p.alt.is_empty() {
                    p.src.clone()
                } else {
                    p.alt.clone()
                }
            }
            Block::Button(p) => format!("{} -> {}", p.label, p.href),
            Block::CourseGrid(p) => format!("{} ({} courses)", p.heading, p.course_ids.len()),
            Block::Testimonial(p) => p.author.clone(),
            Block::Spacer(p) => format!("{}px", p.height),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// The component types the builder offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Hero,
    Text,
    Image,
    Button,
    CourseGrid,
    Testimonial,
    Spacer,
}

impl BlockKind {
    pub const ALL: [BlockKind; 7] = [
        BlockKind::Hero,
        BlockKind::Text,
        BlockKind::Image,
        BlockKind::Button,
        BlockKind::CourseGrid,
        BlockKind::Testimonial,
        BlockKind::Spacer,
    ];

    /// The name used for this kind in JSON and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Hero => "hero",
            BlockKind::Text => "text",
            BlockKind::Image => "image",
            BlockKind::Button => "button",
            BlockKind::CourseGrid => "course-grid",
            BlockKind::Testimonial => "testimonial",
            BlockKind::Spacer => "spacer",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockKind {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        BlockKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| EditError::UnknownBlockKind(s.to_string()))
    }
}

/// Banner at the top of a landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeroProps {
    pub heading: String,
    pub subheading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_href: Option<String>,
}

impl Default for HeroProps {
    fn default() -> Self {
        Self {
            heading: "Welcome".to_string(),
            subheading: String::new(),
            background_image: None,
            cta_label: None,
            cta_href: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextProps {
    pub body: String,
    pub align: TextAlign,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageProps {
    pub src: String,
    pub alt: String,
    /// Rendered width in pixels; `None` = natural width.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Link,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ButtonProps {
    pub label: String,
    pub href: String,
    pub variant: ButtonVariant,
}

impl Default for ButtonProps {
    fn default() -> Self {
        Self {
            label: "Enrol now".to_string(),
            href: "#".to_string(),
            variant: ButtonVariant::Primary,
        }
    }
}

/// Grid of catalogue courses, referenced by course id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CourseGridProps {
    pub heading: String,
    pub course_ids: Vec<String>,
    pub columns: u8,
    pub show_prices: bool,
}

impl Default for CourseGridProps {
    fn default() -> Self {
        Self {
            heading: "Our courses".to_string(),
            course_ids: Vec::new(),
            columns: 3,
            show_prices: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestimonialProps {
    pub quote: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpacerProps {
    pub height: u32,
}

impl Default for SpacerProps {
    fn default() -> Self {
        Self { height: 32 }
    }
}
