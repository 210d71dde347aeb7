pub mod cmd_delete;
pub mod cmd_list;
pub mod cmd_show;
pub mod common;
