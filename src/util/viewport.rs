//! Viewport window math for virtualized lists.
//!
//! Only the rows intersecting the container (plus one row of overscan on each
//! side) are rendered; `offset_y` positions that slice inside the full-height
//! scroll area.

use serde::{Deserialize, Serialize};

use crate::core::RuntimeError;

/// Slice of a list that should be rendered for the current scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleRange {
    /// First rendered item (inclusive).
    pub start: usize,
    /// Last rendered item (exclusive).
    pub end: usize,
    /// Vertical offset of the slice within the scroll area. Negative at the
    /// top of the list, where the overscan row above does not exist.
    pub offset_y: f64,
}

impl VisibleRange {
    /// Number of items in the slice.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the slice renders nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Fixed-row-height viewport calculator.
#[derive(Debug, Clone)]
pub struct ViewportWindow {
    item_height: f64,
    container_height: f64,
    scroll_offset: f64,
}

impl ViewportWindow {
    /// Create a calculator for rows of `item_height` inside a container of `container_height`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidConfig` when either height is not a positive finite number.
    pub fn new(item_height: f64, container_height: f64) -> Result<Self, RuntimeError> {
        if !(item_height.is_finite() && item_height > 0.0) {
            return Err(RuntimeError::InvalidConfig(format!(
                "item_height must be positive, got {item_height}"
            )));
        }
        if !(container_height.is_finite() && container_height > 0.0) {
            return Err(RuntimeError::InvalidConfig(format!(
                "container_height must be positive, got {container_height}"
            )));
        }
        Ok(Self {
            item_height,
            container_height,
            scroll_offset: 0.0,
        })
    }

    /// Record the container's latest scroll position. Negative offsets clamp to 0.
    pub fn update_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = if offset.is_finite() { offset.max(0.0) } else { 0.0 };
    }

    /// Last recorded scroll position.
    #[must_use]
    pub const fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Rows rendered at once: the rows that fit the container plus one of overscan.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn visible_count(&self) -> usize {
        (self.container_height / self.item_height).ceil() as usize + 1
    }

    /// Height of the full list.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_height(&self, total_items: usize) -> f64 {
        total_items as f64 * self.item_height
    }

    /// Slice of `total_items` to render for the recorded scroll offset.
    ///
    /// The overscan row above the first visible row does not exist at the top
    /// of the list. Only `start` is clamped there; `end` and `offset_y` keep
    /// the unclamped start, so `offset_y` is `-item_height` and the slice is
    /// one row shorter.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn visible_range(&self, total_items: usize) -> VisibleRange {
        let first_visible = (self.scroll_offset / self.item_height).floor() as i64;
        let start_unclamped = first_visible - 1;
        let end = start_unclamped
            .saturating_add(self.visible_count() as i64)
            .clamp(0, i64::try_from(total_items).unwrap_or(i64::MAX)) as usize;
        let start = (start_unclamped.max(0) as usize).min(end);
        VisibleRange {
            start,
            end,
            offset_y: start_unclamped as f64 * self.item_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mid_list_window() {
        let mut window = ViewportWindow::new(20.0, 100.0).unwrap();
        window.update_scroll_offset(205.0);
        let range = window.visible_range(1000);
        assert_eq!(range.start, 9);
        assert_eq!(range.end, 15);
        assert!((range.offset_y - 180.0).abs() < f64::EPSILON);
        assert_eq!(window.visible_count(), 6);
    }

    #[test]
    fn test_top_of_list() {
        let mut window = ViewportWindow::new(20.0, 100.0).unwrap();
        for scroll in [0.0, 15.0] {
            window.update_scroll_offset(scroll);
            let range = window.visible_range(1000);
            assert_eq!(range.start, 0);
            assert_eq!(range.end, 5);
            assert!((range.offset_y + 20.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_second_row_has_no_negative_offset() {
        let mut window = ViewportWindow::new(20.0, 100.0).unwrap();
        window.update_scroll_offset(20.0);
        let range = window.visible_range(1000);
        assert_eq!((range.start, range.end), (0, 6));
        assert!(range.offset_y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_top_of_short_list() {
        let window = ViewportWindow::new(20.0, 100.0).unwrap();
        let range = window.visible_range(3);
        assert_eq!((range.start, range.end), (0, 3));
    }

    #[test]
    fn test_end_clamped_to_total() {
        let mut window = ViewportWindow::new(20.0, 100.0).unwrap();
        window.update_scroll_offset(380.0);
        let range = window.visible_range(20);
        assert_eq!(range.start, 18);
        assert_eq!(range.end, 20);
        assert_eq!(range.len(), 2);
    }

    #[test]
    fn test_scrolled_past_end() {
        let mut window = ViewportWindow::new(10.0, 50.0).unwrap();
        window.update_scroll_offset(10_000.0);
        let range = window.visible_range(5);
        assert_eq!(range.start, 5);
        assert_eq!(range.end, 5);
        assert!(range.is_empty());
    }

    #[test]
    fn test_empty_list_and_negative_offset() {
        let mut window = ViewportWindow::new(10.0, 50.0).unwrap();
        window.update_scroll_offset(-30.0);
        assert!(window.scroll_offset().abs() < f64::EPSILON);
        let range = window.visible_range(0);
        assert!(range.is_empty());
        assert!((window.total_height(7) - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(ViewportWindow::new(0.0, 100.0).is_err());
        assert!(ViewportWindow::new(20.0, -1.0).is_err());
        assert!(ViewportWindow::new(f64::NAN, 100.0).is_err());
    }
}
