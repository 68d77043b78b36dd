pub mod chunker;
pub mod dispatcher;
pub mod gateway;
pub mod nlu_client;
pub mod router;
pub mod session_manager;
pub mod translator;
