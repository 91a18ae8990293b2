pub mod fixed_server;
