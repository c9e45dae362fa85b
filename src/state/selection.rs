use crate::processing::hit_test::DataRect;

/// What a primary-button release turned out to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionOutcome {
    /// No press was in progress.
    Nothing,
    /// Released within the drag threshold: pick the nearest point here.
    Click(egui::Pos2),
    /// Released after dragging: delete-candidates are inside this box.
    Region(DataRect),
}

/// Primary-button gesture tracker: a press stays a click until the pointer
/// travels past the drag threshold, then it becomes a rubber-band box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SelectionState {
    #[default]
    Idle,
    PendingClick {
        start_pixel: egui::Pos2,
        start_data: (f64, f64),
    },
    RectSelecting {
        start_data: (f64, f64),
        bbox: DataRect,
    },
}

impl SelectionState {
    pub fn press(&mut self, pixel: egui::Pos2, data: (f64, f64)) {
        *self = SelectionState::PendingClick {
            start_pixel: pixel,
            start_data: data,
        };
    }

    /// Pointer motion with the primary button held. `data` is `None` while
    /// the pointer is outside the plot, which freezes the box.
    pub fn drag(&mut self, pixel: egui::Pos2, data: Option<(f64, f64)>, threshold_px: f32) {
        let Some(data) = data else {
            return;
        };
        match *self {
            SelectionState::PendingClick {
                start_pixel,
                start_data,
            } if start_pixel.distance(pixel) > threshold_px => {
                *self = SelectionState::RectSelecting {
                    start_data,
                    bbox: DataRect::from_corners(start_data, data),
                };
            }
            SelectionState::RectSelecting { start_data, .. } => {
                *self = SelectionState::RectSelecting {
                    start_data,
                    bbox: DataRect::from_corners(start_data, data),
                };
            }
            _ => {}
        }
    }

    /// End the gesture and report what it was.
    pub fn release(&mut self, pixel: egui::Pos2) -> SelectionOutcome {
        let outcome = match *self {
            SelectionState::Idle => SelectionOutcome::Nothing,
            SelectionState::PendingClick { .. } => SelectionOutcome::Click(pixel),
            SelectionState::RectSelecting { bbox, .. } => SelectionOutcome::Region(bbox),
        };
        *self = SelectionState::Idle;
        outcome
    }

    pub fn cancel(&mut self) {
        *self = SelectionState::Idle;
    }

    /// The rubber band to draw, if a box is being dragged.
    pub fn rect(&self) -> Option<DataRect> {
        match self {
            SelectionState::RectSelecting { bbox, .. } => Some(*bbox),
            _ => None,
        }
    }
}
