mod transport_event;

pub use transport_event::TransportEvent;
