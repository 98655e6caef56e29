use shared::protocol::{DirectionTokens, GeneralFilter, GeneralFilterDelta, CREATED_DATE};

use crate::error::ContainerError;

/// Maps list column clicks onto the order-by field and direction.
///
/// Columns are indexed in the same order as the container's order-by fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortController {
    order_bys: Vec<String>,
    recency_field: String,
    directions: DirectionTokens,
}

impl SortController {
    pub fn new(
        order_bys: Vec<String>,
        recency_field: impl Into<String>,
        directions: DirectionTokens,
    ) -> Self {
        let order_bys = if order_bys.is_empty() {
            vec![CREATED_DATE.to_string()]
        } else {
            order_bys
        };
        Self {
            order_bys,
            recency_field: recency_field.into(),
            directions,
        }
    }

    pub fn order_bys(&self) -> &[String] {
        &self.order_bys
    }

    pub fn directions(&self) -> &DirectionTokens {
        &self.directions
    }

    pub fn default_field(&self) -> &str {
        self.order_bys
            .first()
            .map(String::as_str)
            .unwrap_or(CREATED_DATE)
    }

    /// Newest-first for the recency field, ascending for everything else.
    pub fn default_direction(&self, order_by_field: &str) -> &str {
        if order_by_field == self.recency_field {
            &self.directions.descending
        } else {
            &self.directions.ascending
        }
    }

    pub fn handle_column_click(
        &self,
        column_index: usize,
        current: &GeneralFilter,
    ) -> Result<GeneralFilterDelta, ContainerError> {
        let order_by_field =
            self.order_bys
                .get(column_index)
                .ok_or(ContainerError::UnknownColumn {
                    index: column_index,
                    len: self.order_bys.len(),
                })?;

        let direction = if current.order_by_field == *order_by_field {
            self.directions.toggle(&current.direction)
        } else {
            self.default_direction(order_by_field)
        };

        Ok(GeneralFilterDelta::sort(order_by_field.clone(), direction))
    }
}

#[cfg(test)]
#[path = "tests/sort_tests.rs"]
mod tests;
