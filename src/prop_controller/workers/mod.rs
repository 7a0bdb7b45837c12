pub mod loop_thread;
