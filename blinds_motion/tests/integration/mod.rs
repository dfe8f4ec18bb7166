mod common;
mod crash_safety;
mod gateway_lines;
mod move_sequence;
mod update_rule;
