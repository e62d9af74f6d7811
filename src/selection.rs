use egui::Rect;

use crate::layer::LayerId;

/// The set of selected layers.
///
/// Holds at most `limit` ids in the order they were added. The active layer,
/// the one that shows transform handles, exists only while exactly one layer
/// is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    ids: Vec<LayerId>,
    active: Option<LayerId>,
    final_box: Option<Rect>,
    limit: usize,
}

impl Selection {
    pub fn new(limit: usize) -> Self {
        Self {
            ids: Vec::new(),
            active: None,
            final_box: None,
            limit: limit.max(1),
        }
    }

    pub fn ids(&self) -> &[LayerId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.ids.contains(&id)
    }

    pub fn active(&self) -> Option<LayerId> {
        self.active
    }

    /// Exact rectangle of the last marquee drag that selected something
    pub fn final_box(&self) -> Option<Rect> {
        self.final_box
    }

    /// Replace the selection with a single active layer
    pub fn set_single(&mut self, id: LayerId) {
        self.ids = vec![id];
        self.active = Some(id);
        self.final_box = None;
    }

    /// Add or remove a layer. When full, the least recently added layer is dropped.
    pub fn toggle(&mut self, id: LayerId) {
        if let Some(index) = self.ids.iter().position(|selected| *selected == id) {
            self.ids.remove(index);
        } else {
            self.ids.push(id);
            if self.ids.len() > self.limit {
                self.ids.remove(0);
            }
        }
        self.sync_active();
    }

    /// Apply the result of a marquee drag over `rect`.
    ///
    /// An empty hit list clears everything, including the stored box.
    pub fn set_from_marquee(&mut self, mut ids: Vec<LayerId>, rect: Rect) {
        if ids.is_empty() {
            self.clear();
            return;
        }
        ids.truncate(self.limit);
        self.ids = ids;
        self.final_box = Some(rect);
        self.sync_active();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.active = None;
        self.final_box = None;
    }

    /// Drop ids for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(LayerId) -> bool) {
        self.ids.retain(|id| keep(*id));
        if self.ids.is_empty() {
            self.final_box = None;
        }
        self.sync_active();
    }

    fn sync_active(&mut self) {
        self.active = match self.ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;

    #[test]
    fn toggle_keeps_three_most_recent() {
        let ids: Vec<LayerId> = (0..4).map(|_| LayerId::new()).collect();
        let mut selection = Selection::new(3);
        for id in &ids {
            selection.toggle(*id);
        }

        assert_eq!(selection.ids(), &ids[1..]);
        assert_eq!(selection.active(), None);

        selection.toggle(ids[2]);
        selection.toggle(ids[3]);
        assert_eq!(selection.ids(), &[ids[1]]);
        assert_eq!(selection.active(), Some(ids[1]));
    }

    #[test]
    fn plain_click_clears_final_box() {
        let a = LayerId::new();
        let mut selection = Selection::new(3);
        let rect = Rect::from_min_max(Pos2::ZERO, Pos2::new(10.0, 10.0));
        selection.set_from_marquee(vec![a, LayerId::new()], rect);
        assert_eq!(selection.final_box(), Some(rect));

        selection.set_single(a);
        assert_eq!(selection.final_box(), None);
        assert_eq!(selection.active(), Some(a));
    }

    #[test]
    fn empty_marquee_clears_selection() {
        let mut selection = Selection::new(3);
        selection.set_single(LayerId::new());
        selection.set_from_marquee(Vec::new(), Rect::from_min_max(Pos2::ZERO, Pos2::new(5.0, 5.0)));
        assert!(selection.is_empty());
        assert_eq!(selection.final_box(), None);
    }
}
