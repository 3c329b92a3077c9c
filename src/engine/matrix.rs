use std::ops::{Index, IndexMut};

/// A row-major matrix stored in a single buffer.
///
/// Entry `(row, column)` lives at `row * nb_of_columns + column`.
#[derive(Debug, Clone)]
pub struct FlatMatrix<T> {
    nb_of_rows: usize,
    nb_of_columns: usize,
    entries: Vec<T>,
}

impl<T: Copy> FlatMatrix<T> {
    pub fn new(nb_of_rows: usize, nb_of_columns: usize, value: T) -> Self {
        Self {
            nb_of_rows,
            nb_of_columns,
            entries: vec![value; nb_of_rows * nb_of_columns],
        }
    }

    /// Reshapes the matrix, every entry being set to `value`.
    pub fn resize(&mut self, nb_of_rows: usize, nb_of_columns: usize, value: T) {
        self.nb_of_rows = nb_of_rows;
        self.nb_of_columns = nb_of_columns;
        self.entries.clear();
        self.entries.resize(nb_of_rows * nb_of_columns, value);
    }

    pub fn fill(&mut self, value: T) {
        self.entries.iter_mut().for_each(|entry| *entry = value);
    }

    pub fn nb_of_rows(&self) -> usize {
        self.nb_of_rows
    }

    pub fn nb_of_columns(&self) -> usize {
        self.nb_of_columns
    }

    pub fn row(&self, row: usize) -> &[T] {
        debug_assert!(row < self.nb_of_rows);
        let start = row * self.nb_of_columns;
        &self.entries[start..start + self.nb_of_columns]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        debug_assert!(row < self.nb_of_rows);
        let start = row * self.nb_of_columns;
        &mut self.entries[start..start + self.nb_of_columns]
    }
}

impl<T> Index<(usize, usize)> for FlatMatrix<T> {
    type Output = T;

    fn index(&self, (row, column): (usize, usize)) -> &Self::Output {
        debug_assert!(row < self.nb_of_rows && column < self.nb_of_columns);
        &self.entries[row * self.nb_of_columns + column]
    }
}

impl<T> IndexMut<(usize, usize)> for FlatMatrix<T> {
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut Self::Output {
        debug_assert!(row < self.nb_of_rows && column < self.nb_of_columns);
        &mut self.entries[row * self.nb_of_columns + column]
    }
}
