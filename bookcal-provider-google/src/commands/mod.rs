pub mod authenticate;
pub mod create_event;
pub mod delete_event;
pub mod find_calendar;
pub mod find_event;
pub mod update_event;
