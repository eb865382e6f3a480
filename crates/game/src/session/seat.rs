#[derive(Debug)]
pub struct SeatSlot<C> {
    connection: Option<C>,
    restart_requested: bool,
}

impl<C> SeatSlot<C> {
    pub fn new() -> Self {
        Self {
            connection: None,
            restart_requested: false,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection(&self) -> Option<&C> {
        self.connection.as_ref()
    }

    pub fn connection_mut(&mut self) -> Option<&mut C> {
        self.connection.as_mut()
    }

    pub fn occupy(&mut self, connection: C) {
        self.connection = Some(connection);
        self.restart_requested = false;
    }

    pub fn vacate(&mut self) -> Option<C> {
        self.restart_requested = false;
        self.connection.take()
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }

    pub fn clear_restart(&mut self) {
        self.restart_requested = false;
    }
}

impl<C> Default for SeatSlot<C> {
    fn default() -> Self {
        Self::new()
    }
}
