//! Cell kinds and their properties.
//! Properties are queried via methods, not stored as flags,
//! so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum CellKind {
    Wall,       // Solid, drawn dark
    Empty,      // Must be visited exactly once
    Start,      // Player spawn, visited from the beginning
    Finish,     // Last cell of a solution
    Background, // Outside the playfield, behaves like a wall
}

impl CellKind {
    pub const ALL: [CellKind; 5] = [
        CellKind::Wall,
        CellKind::Empty,
        CellKind::Start,
        CellKind::Finish,
        CellKind::Background,
    ];

    /// Can the pointer stand on this cell?
    pub fn is_traversable(self) -> bool {
        matches!(self, CellKind::Empty | CellKind::Start | CellKind::Finish)
    }

    /// Must this cell be visited before the level counts as solved?
    /// Start is excluded: it is visited from the first frame.
    pub fn must_visit(self) -> bool {
        matches!(self, CellKind::Empty | CellKind::Finish)
    }

    /// Element name used in level pack files.
    pub fn tag(self) -> &'static str {
        match self {
            CellKind::Wall       => "wall",
            CellKind::Empty      => "empty",
            CellKind::Start      => "start",
            CellKind::Finish     => "finish",
            CellKind::Background => "background",
        }
    }

    pub fn from_tag(tag: &str) -> Option<CellKind> {
        match tag {
            "wall"       => Some(CellKind::Wall),
            "empty"      => Some(CellKind::Empty),
            "start"      => Some(CellKind::Start),
            "finish"     => Some(CellKind::Finish),
            "background" => Some(CellKind::Background),
            _ => None,
        }
    }
}

/// One plate of the field. The kind never changes after load;
/// only the visited flag is touched during play.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    kind: CellKind,
    visited: bool,
}

impl Cell {
    /// New cell as it looks right after loading: only Start is visited.
    pub fn new(kind: CellKind) -> Self {
        Cell { kind, visited: kind == CellKind::Start }
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_traversable(&self) -> bool {
        self.kind.is_traversable()
    }

    pub fn is_visited(&self) -> bool {
        self.visited
    }

    /// Walls and background never take a visit.
    pub fn mark_visited(&mut self) {
        if self.kind.is_traversable() {
            self.visited = true;
        }
    }

    pub fn reset_visited(&mut self) {
        self.visited = false;
    }
}

impl From<CellKind> for Cell {
    fn from(kind: CellKind) -> Self {
        Cell::new(kind)
    }
}
