//! Touch-driven placement and manipulation of virtual objects on detected
//! AR planes. The runtime (tracking, rendering, haptics) is reached through
//! the [`plane::Raycaster`], [`placement::ModelFactory`] and
//! [`feedback::Haptics`] traits; [`session::InteractionSession`] ties the
//! pieces together once per frame.

pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod feedback;
pub mod gestures;
pub mod manipulation;
pub mod placement;
pub mod plane;
pub mod policy;
pub mod replay;
pub mod scene;
pub mod session;
pub mod touch;
