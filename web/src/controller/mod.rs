pub(crate) mod health_check_controller;
pub(crate) mod snapshot_controller;
pub(crate) mod stream_controller;
