mod connection_event_test;
mod expiration_test;
mod hierarchy_test;
