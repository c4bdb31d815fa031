//! Width balancing for side-by-side module columns.

use crate::surface::{ContainerId, PageSurface, Width};

/// Spacing actually applied to the left column of a row.
///
/// On a mirrored page the configured split is flipped so the wider
/// column stays toward the binding; an even split needs no flip.
pub fn effective_spacing(spacing: u8, mirrored: bool) -> u8 {
    let spacing = spacing.min(100);
    if mirrored && spacing != 50 {
        100 - spacing
    } else {
        spacing
    }
}

/// Assigns column widths for one double row and rebalances them.
///
/// Both columns first take their percentage split. The taller one is
/// then released to natural width, which lets its text run into
/// whatever the shorter column leaves free. Ties release the right
/// column.
pub fn balance_columns(
    surface: &mut dyn PageSurface,
    left: ContainerId,
    right: ContainerId,
    spacing: u8,
    mirrored: bool,
) {
    let spacing = effective_spacing(spacing, mirrored);
    surface.set_width(left, Width::Percent(spacing));
    surface.set_width(right, Width::Percent(100 - spacing));
    let left_height = surface.measure(left).content;
    let right_height = surface.measure(right).content;
    if left_height > right_height {
        surface.set_width(left, Width::Natural);
    } else {
        surface.set_width(right, Width::Natural);
    }
}
