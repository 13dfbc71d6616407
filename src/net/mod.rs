pub mod message_sizes;
