mod completions;
mod habits;
mod timer_sessions;
