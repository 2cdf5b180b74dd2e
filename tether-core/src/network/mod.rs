pub mod connection;
pub mod serial;
pub mod transport;

pub use connection::ConnectionInfo;
pub use serial::SerialLink;
pub use transport::{FrameReader, FrameWriter, PacketSink, split};
