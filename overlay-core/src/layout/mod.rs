//! Device-class viewport adjustment.
//!
//! Most capture APIs report frame dimensions pre-rotation while the viewport
//! is measured post-rotation, so by default the viewport's axes are swapped
//! before the transform stages see it. Large tablets in landscape already
//! report post-rotation dimensions and must not be swapped.
//!
//! The quirk is kept as a data table keyed by
//! `(DeviceClass, OrientationClass)` rather than control flow, so a newly
//! discovered platform is a new [`AxisRule`] row, not another branch in the
//! transform math.

use serde::{Deserialize, Serialize};

use crate::geometry::{Orientation, Size};

/// Coarse device bucket used by the axis-swap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceClass {
    #[default]
    Phone,
    LargeTablet,
}

/// Coarse orientation bucket used by the axis-swap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrientationClass {
    Portrait,
    Landscape,
}

impl From<Orientation> for OrientationClass {
    fn from(orientation: Orientation) -> Self {
        if orientation.is_landscape() {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// One row of the axis-swap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisRule {
    pub device: DeviceClass,
    pub orientation: OrientationClass,
    pub swap_axes: bool,
}

/// Lookup table deciding whether the viewport axes are swapped before the
/// scale/rotation stages.
///
/// Injected as configuration; [`LayoutTable::default`] ships the known
/// platform behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutTable {
    rules: Vec<AxisRule>,
    /// Applied when no rule matches.
    default_swap: bool,
}

impl LayoutTable {
    pub fn new(rules: Vec<AxisRule>, default_swap: bool) -> Self {
        Self {
            rules,
            default_swap,
        }
    }

    /// First matching rule wins; the table default applies otherwise.
    pub fn swap_axes(&self, device: DeviceClass, orientation: Orientation) -> bool {
        let class = OrientationClass::from(orientation);
        self.rules
            .iter()
            .find(|rule| rule.device == device && rule.orientation == class)
            .map(|rule| rule.swap_axes)
            .unwrap_or(self.default_swap)
    }

    /// The reference size handed to the scale/rotation stages for this
    /// device and orientation.
    pub fn adjust_viewport(
        &self,
        viewport: Size,
        device: DeviceClass,
        orientation: Orientation,
    ) -> Size {
        if self.swap_axes(device, orientation) {
            viewport.swapped()
        } else {
            viewport
        }
    }
}

impl Default for LayoutTable {
    fn default() -> Self {
        Self::new(
            vec![AxisRule {
                device: DeviceClass::LargeTablet,
                orientation: OrientationClass::Landscape,
                swap_axes: false,
            }],
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Orientation;

    #[test]
    fn default_table_swaps_for_phones() {
        let table = LayoutTable::default();
        let viewport = Size::new(600.0, 800.0);
        for orientation in [
            Orientation::Portrait,
            Orientation::PortraitUpsideDown,
            Orientation::LandscapeLeft,
            Orientation::LandscapeRight,
            Orientation::Unknown,
        ] {
            assert_eq!(
                Size::new(800.0, 600.0),
                table.adjust_viewport(viewport, DeviceClass::Phone, orientation)
            );
        }
    }

    #[test]
    fn large_tablet_landscape_is_exempt() {
        let table = LayoutTable::default();
        let viewport = Size::new(600.0, 800.0);

        assert_eq!(
            viewport,
            table.adjust_viewport(viewport, DeviceClass::LargeTablet, Orientation::LandscapeLeft)
        );
        assert_eq!(
            viewport,
            table.adjust_viewport(
                viewport,
                DeviceClass::LargeTablet,
                Orientation::LandscapeRight
            )
        );
        // Portrait tablets behave like phones.
        assert_eq!(
            viewport.swapped(),
            table.adjust_viewport(viewport, DeviceClass::LargeTablet, Orientation::Portrait)
        );
    }

    #[test]
    fn custom_rows_override_the_default() {
        let table = LayoutTable::new(
            vec![AxisRule {
                device: DeviceClass::Phone,
                orientation: OrientationClass::Portrait,
                swap_axes: false,
            }],
            true,
        );
        let viewport = Size::new(100.0, 200.0);
        assert_eq!(
            viewport,
            table.adjust_viewport(viewport, DeviceClass::Phone, Orientation::Portrait)
        );
        assert_eq!(
            viewport.swapped(),
            table.adjust_viewport(viewport, DeviceClass::Phone, Orientation::LandscapeLeft)
        );
    }
}
