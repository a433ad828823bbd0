//! Canvas-side helpers
//!
//! Positions belong to the rendering collaborator. This module gives it what it needs from the
//! schema (connector anchors, free spots for new tables) and an explicit drag session value
//! instead of hidden "active table" state.

use rand::Rng;
use uuid::Uuid;

use crate::schema::store::EntityStore;
use crate::schema::types::Position;

/// Rendered width of a table box
pub const TABLE_WIDTH: f64 = 240.0;

/// Margins used when placing new tables
const LEFT_MARGIN: i64 = 16;
const TOP_MARGIN: i64 = 64;

/// Drawable canvas size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Pick a random spot for a new table that shares neither x nor y with an existing table.
///
/// Gives up after a bounded number of draws and returns the last candidate.
pub fn free_position<R: Rng>(existing: &[Position], bounds: Bounds, rng: &mut R) -> Position {
    let max_x = (bounds.width - TABLE_WIDTH).max(LEFT_MARGIN as f64) as i64;
    let max_y = (bounds.height - TABLE_WIDTH).max(TOP_MARGIN as f64) as i64;

    let mut candidate = Position::new(LEFT_MARGIN as f64, TOP_MARGIN as f64);
    for _ in 0..64 {
        candidate = Position::new(
            rng.gen_range(LEFT_MARGIN..=max_x) as f64,
            rng.gen_range(TOP_MARGIN..=max_y) as f64,
        );

        if existing
            .iter()
            .all(|p| p.x != candidate.x && p.y != candidate.y)
        {
            break;
        }
    }

    candidate
}

/// Pointer offset captured when a table is grabbed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    table_id: Uuid,
    offset: Position,
}

impl DragSession {
    /// Start dragging `table_id`, currently at `origin`, grabbed at `pointer`
    pub fn begin(table_id: Uuid, origin: Position, pointer: Position) -> Self {
        Self {
            table_id,
            offset: Position::new(pointer.x - origin.x, pointer.y - origin.y),
        }
    }

    pub fn table_id(&self) -> Uuid {
        self.table_id
    }

    /// Table position that keeps the grab point under `pointer`
    pub fn position_at(&self, pointer: Position) -> Position {
        Position::new(pointer.x - self.offset.x, pointer.y - self.offset.y)
    }
}

/// What the renderer needs to draw one relation line
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub relation_id: Uuid,
    pub from: Position,
    pub to: Position,
    /// Index of the owning field within its table's field list
    pub field_index: usize,
}

/// Connector anchors for every drawable relation in the store
pub fn connectors(store: &EntityStore) -> Vec<Connector> {
    store
        .relations()
        .filter_map(|relation| {
            let from = store.table(relation.from_table_id)?;
            let to = store.table(relation.to_table_id)?;
            let field_index = store
                .fields_of(relation.from_table_id)
                .position(|f| f.id == relation.field_id)?;

            Some(Connector {
                relation_id: relation.id,
                from: from.position,
                to: to.position,
                field_index,
            })
        })
        .collect()
}
