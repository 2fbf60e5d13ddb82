//! TUI command - Interactive form and results table

use std::time::Duration;

use adls_meta_core::{FormInputs, Pipeline, Result, ViewerError};
use clap::Args;

use crate::commands::Cli;
use crate::tui::ui;
use crate::tui::{App, Event, EventHandler, enter_terminal};

#[derive(Debug, Clone, Args)]
pub struct TuiCommand;

impl TuiCommand {
    pub async fn run(&self, cli: &Cli, inputs: FormInputs) -> Result<()> {
        // Initialize terminal; the guard restores it on any exit
        let (mut terminal, _guard) = enter_terminal().map_err(ViewerError::Io)?;

        let mut app = App::new(inputs, cli.profile.clone(), Pipeline::azure());

        let mut events = EventHandler::new(Duration::from_millis(250));
        app.set_event_tx(events.message_tx());

        while app.running {
            terminal
                .draw(|frame| ui::render(&mut app, frame))
                .map_err(ViewerError::Io)?;

            match events.next().await {
                Some(Event::Key(key)) => app.handle_key(key),
                Some(Event::Mouse(mouse)) => app.handle_mouse(mouse),
                Some(Event::Tick) => {}
                Some(Event::Message(msg)) => app.handle_message(msg),
                None => break,
            }
        }

        Ok(())
    }
}
