//! Computed style consumed by layout.
//!
//! [§ 4.4 Computed Values](https://www.w3.org/TR/css-cascade-4/#computed)
//! "The computed value is the result of resolving the specified value..."
//!
//! Style resolution itself happens elsewhere. The layout core reads these
//! values and never writes them; `apply_declaration` exists so documents
//! and tests can state computed values as `property: value` text.

use boxflow_common::warning::warn_once;
use serde::Serialize;

use super::keywords::{ClearValue, DisplayValue, FloatValue, OverflowValue, PositionType};
use super::values::{AutoLength, DEFAULT_FONT_SIZE_PX, LengthValue, MaxLength};
use super::StyleParseError;

/// Edge values (margin, padding, border widths, box offsets) for the four
/// physical sides.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Sides<T> {
    /// Top edge.
    pub top: T,
    /// Right edge.
    pub right: T,
    /// Bottom edge.
    pub bottom: T,
    /// Left edge.
    pub left: T,
}

impl<T: Copy> Sides<T> {
    /// The same value on every side.
    pub const fn uniform(value: T) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    ///
    /// "If there is only one component value, it applies to all sides. If
    /// there are two values, the top and bottom margins are set to the first
    /// value and the right and left margins are set to the second. If there
    /// are three values, the top is set to the first value, the left and right
    /// are set to the second, and the bottom is set to the third. If there are
    /// four values, they apply to the top, right, bottom, and left."
    fn from_shorthand(values: &[T]) -> Option<Self> {
        match *values {
            [all] => Some(Self::uniform(all)),
            [vertical, horizontal] => Some(Self {
                top: vertical,
                right: horizontal,
                bottom: vertical,
                left: horizontal,
            }),
            [top, horizontal, bottom] => Some(Self {
                top,
                right: horizontal,
                bottom,
                left: horizontal,
            }),
            [top, right, bottom, left] => Some(Self {
                top,
                right,
                bottom,
                left,
            }),
            _ => None,
        }
    }
}

/// Computed styles for an element, as far as layout is concerned.
///
/// Every field holds the computed value; unset properties hold their CSS
/// initial value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputedStyle {
    /// [§ 2 'display'](https://www.w3.org/TR/css-display-3/#the-display-properties)
    pub display: DisplayValue,
    /// [§ 9.3.1 'position'](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
    pub position: PositionType,
    /// [§ 9.5.1 'float'](https://www.w3.org/TR/CSS2/visuren.html#float-position)
    pub float: FloatValue,
    /// [§ 9.5.2 'clear'](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
    pub clear: ClearValue,
    /// [§ 11.1.1 'overflow'](https://www.w3.org/TR/CSS2/visufx.html#overflow)
    ///
    /// Only the vertical axis matters here: it decides whether a scrollbar
    /// may appear and narrow the content width.
    pub overflow_y: OverflowValue,
    /// [§ 10.2 'width'](https://www.w3.org/TR/CSS2/visudet.html#the-width-property)
    pub width: AutoLength,
    /// [§ 10.5 'height'](https://www.w3.org/TR/CSS2/visudet.html#the-height-property)
    pub height: AutoLength,
    /// [§ 10.7 'min-height'](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
    pub min_height: LengthValue,
    /// [§ 10.7 'max-height'](https://www.w3.org/TR/CSS2/visudet.html#min-max-heights)
    pub max_height: MaxLength,
    /// [§ 8.3 Margin properties](https://www.w3.org/TR/CSS2/box.html#margin-properties)
    pub margin: Sides<AutoLength>,
    /// [§ 8.4 Padding properties](https://www.w3.org/TR/CSS2/box.html#padding-properties)
    pub padding: Sides<LengthValue>,
    /// [§ 8.5.1 Border width](https://www.w3.org/TR/CSS2/box.html#border-width-properties)
    ///
    /// Computed border widths are absolute lengths.
    pub border: Sides<f32>,
    /// [§ 9.3.2 Box offsets](https://www.w3.org/TR/CSS2/visuren.html#position-props)
    pub offsets: Sides<AutoLength>,
    /// [§ 3.5 'font-size'](https://www.w3.org/TR/css-fonts-4/#font-size-prop)
    pub font_size: f32,
    /// [§ 10.8 'line-height'](https://www.w3.org/TR/CSS2/visudet.html#line-height)
    ///
    /// `None` is `normal`: the inline content producer decides.
    pub line_height: Option<f32>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: DisplayValue::Inline,
            position: PositionType::Static,
            float: FloatValue::None,
            clear: ClearValue::None,
            overflow_y: OverflowValue::Visible,
            width: AutoLength::Auto,
            height: AutoLength::Auto,
            min_height: LengthValue::Px(0.0),
            max_height: MaxLength::None,
            margin: Sides::uniform(AutoLength::px(0.0)),
            padding: Sides::uniform(LengthValue::Px(0.0)),
            border: Sides::uniform(0.0),
            offsets: Sides::uniform(AutoLength::Auto),
            font_size: DEFAULT_FONT_SIZE_PX,
            line_height: None,
        }
    }
}

impl ComputedStyle {
    /// A style with the given display value and initial values elsewhere.
    #[must_use]
    pub fn with_display(display: DisplayValue) -> Self {
        Self {
            display,
            ..Self::default()
        }
    }

    /// Parse a `name: value; name: value` declaration list on top of the
    /// initial values.
    ///
    /// # Errors
    /// Returns the first declaration that fails to parse.
    pub fn parse(declarations: &str) -> Result<Self, StyleParseError> {
        let mut style = Self::default();
        for declaration in declarations.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }
            let (name, value) = declaration
                .split_once(':')
                .ok_or_else(|| StyleParseError::MalformedDeclaration(declaration.to_string()))?;
            style.apply_declaration(name.trim(), value.trim())?;
        }
        Ok(style)
    }

    /// Apply one `property: value` pair.
    ///
    /// Properties layout does not read are skipped with a one-time warning.
    ///
    /// # Errors
    /// Unparsable values are rejected.
    pub fn apply_declaration(&mut self, name: &str, value: &str) -> Result<(), StyleParseError> {
        let keyword = |v: &str| StyleParseError::InvalidKeyword {
            property: name.to_string(),
            value: v.to_string(),
        };
        match name.to_ascii_lowercase().as_str() {
            "display" => self.display = value.parse().map_err(|_| keyword(value))?,
            "position" => self.position = value.parse().map_err(|_| keyword(value))?,
            "float" => self.float = value.parse().map_err(|_| keyword(value))?,
            "clear" => self.clear = value.parse().map_err(|_| keyword(value))?,
            "overflow" | "overflow-y" => {
                self.overflow_y = value.parse().map_err(|_| keyword(value))?;
            }
            "width" => self.width = value.parse()?,
            "height" => self.height = value.parse()?,
            "min-height" => self.min_height = value.parse()?,
            "max-height" => self.max_height = value.parse()?,
            "margin" => self.margin = parse_sides(name, value)?,
            "margin-top" => self.margin.top = value.parse()?,
            "margin-right" => self.margin.right = value.parse()?,
            "margin-bottom" => self.margin.bottom = value.parse()?,
            "margin-left" => self.margin.left = value.parse()?,
            "padding" => self.padding = parse_sides(name, value)?,
            "padding-top" => self.padding.top = value.parse()?,
            "padding-right" => self.padding.right = value.parse()?,
            "padding-bottom" => self.padding.bottom = value.parse()?,
            "padding-left" => self.padding.left = value.parse()?,
            "border-width" => {
                let sides: Sides<LengthValue> = parse_sides(name, value)?;
                self.border = Sides {
                    top: absolute(name, sides.top)?,
                    right: absolute(name, sides.right)?,
                    bottom: absolute(name, sides.bottom)?,
                    left: absolute(name, sides.left)?,
                };
            }
            "border-top-width" => self.border.top = absolute(name, value.parse()?)?,
            "border-right-width" => self.border.right = absolute(name, value.parse()?)?,
            "border-bottom-width" => self.border.bottom = absolute(name, value.parse()?)?,
            "border-left-width" => self.border.left = absolute(name, value.parse()?)?,
            "top" => self.offsets.top = value.parse()?,
            "right" => self.offsets.right = value.parse()?,
            "bottom" => self.offsets.bottom = value.parse()?,
            "left" => self.offsets.left = value.parse()?,
            "font-size" => self.font_size = absolute(name, value.parse()?)?,
            "line-height" => {
                self.line_height = if value.eq_ignore_ascii_case("normal") {
                    None
                } else {
                    Some(absolute(name, value.parse()?)?)
                };
            }
            unknown => {
                let _ = warn_once("style", &format!("ignoring property '{unknown}'"));
            }
        }
        Ok(())
    }

    /// Look up a property by name and print its computed value.
    ///
    /// Used only to build diagnostic messages.
    #[must_use]
    pub fn property_text(&self, name: &str) -> Option<String> {
        let text = match name.to_ascii_lowercase().as_str() {
            "display" => self.display.to_string(),
            "position" => self.position.to_string(),
            "float" => self.float.to_string(),
            "clear" => self.clear.to_string(),
            "overflow" | "overflow-y" => self.overflow_y.to_string(),
            "width" => self.width.to_string(),
            "height" => self.height.to_string(),
            "min-height" => self.min_height.to_string(),
            "max-height" => self.max_height.to_string(),
            "font-size" => format!("{}px", self.font_size),
            "line-height" => self
                .line_height
                .map_or_else(|| String::from("normal"), |lh| format!("{lh}px")),
            _ => return None,
        };
        Some(text)
    }

    /// [§ 9.4.1 Block formatting contexts](https://www.w3.org/TR/CSS2/visuren.html#block-formatting)
    ///
    /// "Floats, absolutely positioned elements, block containers (such as
    /// inline-blocks, table-cells, and table-captions) that are not block
    /// boxes, and block boxes with 'overflow' other than 'visible' (except
    /// when that value has been propagated to the viewport) establish new
    /// block formatting contexts for their contents."
    #[must_use]
    pub fn establishes_bfc(&self) -> bool {
        self.float != FloatValue::None
            || self.position.is_out_of_flow()
            || self.overflow_y.establishes_bfc()
            || matches!(
                self.display,
                DisplayValue::InlineBlock | DisplayValue::TableCell | DisplayValue::Table
            )
    }
}

fn parse_sides<T>(property: &str, value: &str) -> Result<Sides<T>, StyleParseError>
where
    T: Copy + std::str::FromStr<Err = StyleParseError>,
{
    let parts = value
        .split_whitespace()
        .map(str::parse::<T>)
        .collect::<Result<Vec<T>, _>>()?;
    Sides::from_shorthand(&parts).ok_or_else(|| StyleParseError::InvalidKeyword {
        property: property.to_string(),
        value: value.to_string(),
    })
}

fn absolute(property: &str, value: LengthValue) -> Result<f32, StyleParseError> {
    match value {
        LengthValue::Px(px) => Ok(px),
        LengthValue::Percent(_) => Err(StyleParseError::InvalidKeyword {
            property: property.to_string(),
            value: value.to_string(),
        }),
    }
}
