//! Keyword-valued properties: display, position, float, clear, overflow.
//!
//! Each enum parses from and prints back to its CSS keyword, which is what
//! diagnostics use to name an offending value.

use serde::Serialize;
use strum_macros::{EnumString, IntoStaticStr};

/// [§ 2 Box Layout Modes: the display property](https://www.w3.org/TR/css-display-3/#the-display-properties)
///
/// "The display property defines an element's display type, which consists of
/// the two basic qualities of how an element generates boxes."
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    EnumString,
    IntoStaticStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayValue {
    /// "The element and its descendants generate no boxes or text runs."
    None,
    /// "The element generates a block-level box."
    Block,
    /// "The element generates an inline-level box."
    #[default]
    Inline,
    /// "This value causes an element to generate an inline-level block container."
    InlineBlock,
    /// [§ 17.2 The CSS table model](https://www.w3.org/TR/CSS2/tables.html#table-display)
    /// "Specifies that an element defines a block-level table."
    Table,
    /// "Specifies that an element is a row of cells."
    TableRow,
    /// "Specifies that an element groups one or more rows."
    TableRowGroup,
    /// "Like 'table-row-group', but for visual formatting, the row group is
    /// always displayed before all other rows and row groups."
    TableHeaderGroup,
    /// "Like 'table-row-group', but for visual formatting, the row group is
    /// always displayed after all other rows and row groups."
    TableFooterGroup,
    /// "Specifies that an element describes a column of cells."
    TableColumn,
    /// "Specifies that an element groups one or more columns."
    TableColumnGroup,
    /// "Specifies that an element represents a table cell."
    TableCell,
}

impl DisplayValue {
    /// The table-internal display values. These only mean something inside
    /// a table formatting context.
    #[must_use]
    pub const fn is_table_internal(self) -> bool {
        matches!(
            self,
            Self::TableRow
                | Self::TableRowGroup
                | Self::TableHeaderGroup
                | Self::TableFooterGroup
                | Self::TableColumn
                | Self::TableColumnGroup
                | Self::TableCell
        )
    }

    /// Row groups (`table-row-group`, `table-header-group`, `table-footer-group`).
    #[must_use]
    pub const fn is_row_group(self) -> bool {
        matches!(
            self,
            Self::TableRowGroup | Self::TableHeaderGroup | Self::TableFooterGroup
        )
    }

    /// The CSS keyword for this value.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        self.into()
    }
}

/// [§ 9.3.1 Choosing a positioning scheme: 'position' property](https://www.w3.org/TR/CSS2/visuren.html#choose-position)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    EnumString,
    IntoStaticStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum PositionType {
    /// "The box is a normal box, laid out according to the normal flow."
    #[default]
    Static,
    /// "The box's position is calculated according to the normal flow.
    /// Then the box is offset relative to its normal position."
    Relative,
    /// "The box's position (and possibly size) is specified with the
    /// 'top', 'right', 'bottom', and 'left' properties."
    Absolute,
    /// "The box's position is calculated according to the 'absolute' model,
    /// but the box is fixed with respect to some reference."
    Fixed,
}

impl PositionType {
    /// Absolute and fixed boxes are taken out of normal flow.
    #[must_use]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// [§ 9.5.1 Positioning the float: the 'float' property](https://www.w3.org/TR/CSS2/visuren.html#float-position)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    EnumString,
    IntoStaticStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum FloatValue {
    /// "The box is not floated."
    #[default]
    None,
    /// "The element generates a block box that is floated to the left."
    Left,
    /// "The element generates a block box that is floated to the right."
    Right,
}

/// [§ 9.5.2 Controlling flow next to floats: the 'clear' property](https://www.w3.org/TR/CSS2/visuren.html#flow-control)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    EnumString,
    IntoStaticStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum ClearValue {
    /// "No constraint on the box's position with respect to floats."
    #[default]
    None,
    /// "Requires the top border edge be below any left-floating boxes."
    Left,
    /// "Requires the top border edge be below any right-floating boxes."
    Right,
    /// "Requires the top border edge be below any floating boxes."
    Both,
}

/// [§ 11.1.1 Overflow: the 'overflow' property](https://www.w3.org/TR/CSS2/visufx.html#overflow)
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    EnumString,
    IntoStaticStr,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowValue {
    /// "Content is not clipped, i.e., it may be rendered outside the block box."
    #[default]
    Visible,
    /// "The content is clipped and that no scrolling user interface should be provided."
    Hidden,
    /// "Should cause a scrolling mechanism to be provided for overflowing boxes."
    Auto,
    /// "A scrolling mechanism is always displayed."
    Scroll,
}

impl OverflowValue {
    /// Anything but `visible` establishes a new block formatting context.
    #[must_use]
    pub const fn establishes_bfc(self) -> bool {
        !matches!(self, Self::Visible)
    }
}
