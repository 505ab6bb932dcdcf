//! Grid layout for graphs imported without positions.

use clap::Args;
use mpe_pipeline::model::Position;
use mpe_pipeline::{GraphStore, LayoutEngine};

use crate::TRACING_TARGET_COMMAND;

/// Grid layout configuration.
#[derive(Debug, Clone, Copy, PartialEq, Args)]
pub struct LayoutConfig {
    /// Nodes per grid row.
    #[arg(
        long = "layout-columns",
        env = "MPE_LAYOUT_COLUMNS",
        default_value_t = 4,
        value_parser = clap::value_parser!(u32).range(1..),
        global = true
    )]
    pub layout_columns: u32,

    /// Horizontal distance between grid cells.
    #[arg(
        long = "layout-spacing-x",
        env = "MPE_LAYOUT_SPACING_X",
        default_value_t = 300.0,
        global = true
    )]
    pub layout_spacing_x: f64,

    /// Vertical distance between grid cells.
    #[arg(
        long = "layout-spacing-y",
        env = "MPE_LAYOUT_SPACING_Y",
        default_value_t = 200.0,
        global = true
    )]
    pub layout_spacing_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layout_columns: 4,
            layout_spacing_x: 300.0,
            layout_spacing_y: 200.0,
        }
    }
}

/// Places nodes row by row in store order.
#[derive(Debug, Clone, Copy)]
pub struct GridLayout {
    config: LayoutConfig,
}

impl GridLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }
}

impl LayoutEngine for GridLayout {
    fn auto_layout(&mut self, store: &mut dyn GraphStore) {
        let columns = self.config.layout_columns.max(1) as usize;
        let nodes = store.nodes_mut();

        for (index, node) in nodes.iter_mut().enumerate() {
            let column = (index % columns) as f64;
            let row = (index / columns) as f64;
            node.position = Position::new(
                column * self.config.layout_spacing_x,
                row * self.config.layout_spacing_y,
            );
        }

        tracing::debug!(
            target: TRACING_TARGET_COMMAND,
            node_count = nodes.len(),
            columns,
            "Applied grid layout"
        );
    }
}
