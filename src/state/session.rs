use crate::data::table::Dataset;

/// The live document: every loaded dataset plus the active X/Y columns.
///
/// Datasets keep their load order, which is also the tie-break order for
/// point hit testing. The column choices are the union of all column names
/// in first-appearance order.
#[derive(Debug, Clone, Default)]
pub struct Session {
    datasets: Vec<Dataset>,
    column_choices: Vec<String>,
    x_column: Option<String>,
    y_column: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn dataset(&self, index: usize) -> Option<&Dataset> {
        self.datasets.get(index)
    }

    pub(crate) fn dataset_mut(&mut self, index: usize) -> Option<&mut Dataset> {
        self.datasets.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Append a dataset. Its first two columns become the X/Y defaults only
    /// where no column has been chosen yet.
    pub fn add(&mut self, dataset: Dataset) {
        let (first, second) = {
            let mut names = dataset.table.column_names();
            let first = names.next().map(str::to_string);
            (first, names.next().map(str::to_string))
        };
        if self.x_column.is_none() {
            self.x_column = first;
        }
        if self.y_column.is_none() {
            self.y_column = second;
        }
        self.datasets.push(dataset);
        self.recompute_column_choices();
    }

    /// Delete row positions from one dataset. An unknown dataset index is a
    /// no-op. Returns the number of rows removed.
    pub fn remove_rows(&mut self, dataset_index: usize, positions: &[usize]) -> usize {
        match self.datasets.get_mut(dataset_index) {
            Some(ds) => ds.table.remove_rows(positions),
            None => 0,
        }
    }

    /// Drop every dataset and forget the column selection.
    pub fn clear(&mut self) {
        self.datasets.clear();
        self.column_choices.clear();
        self.x_column = None;
        self.y_column = None;
    }

    /// Swap in a whole dataset collection (undo). The column selection is
    /// kept even if the restored datasets lack those columns.
    pub fn replace_datasets(&mut self, datasets: Vec<Dataset>) {
        self.datasets = datasets;
        self.recompute_column_choices();
    }

    pub fn column_choices(&self) -> &[String] {
        &self.column_choices
    }

    pub fn x_column(&self) -> Option<&str> {
        self.x_column.as_deref()
    }

    pub fn y_column(&self) -> Option<&str> {
        self.y_column.as_deref()
    }

    pub fn set_x_column(&mut self, name: impl Into<String>) {
        self.x_column = Some(name.into());
    }

    pub fn set_y_column(&mut self, name: impl Into<String>) {
        self.y_column = Some(name.into());
    }

    /// Owned copies of the selected (X, Y) pair, if both are chosen.
    pub fn active_columns(&self) -> Option<(String, String)> {
        Some((self.x_column.clone()?, self.y_column.clone()?))
    }

    fn recompute_column_choices(&mut self) {
        let mut choices: Vec<String> = Vec::new();
        for name in self.datasets.iter().flat_map(|d| d.table.column_names()) {
            if !choices.iter().any(|c| c == name) {
                choices.push(name.to_string());
            }
        }
        self.column_choices = choices;
    }
}
