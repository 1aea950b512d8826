/// Direction of data flow in a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ToServer,
    ToClient,
}

impl Direction {
    /// Return a string representation of the direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToServer => "to_server",
            Direction::ToClient => "to_client",
        }
    }
}

/// Stream flags passed along with each chunk of reassembled data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFlags {
    pub direction: Direction,
    /// Last data for this direction.
    pub eof: bool,
}

impl StreamFlags {
    pub fn to_server() -> Self {
        Self {
            direction: Direction::ToServer,
            eof: false,
        }
    }

    pub fn to_client() -> Self {
        Self {
            direction: Direction::ToClient,
            eof: false,
        }
    }

    pub fn with_eof(mut self, eof: bool) -> Self {
        self.eof = eof;
        self
    }
}
