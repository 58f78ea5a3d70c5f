pub mod index_server;
