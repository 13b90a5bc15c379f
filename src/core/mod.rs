//! The coop control loop.
//!
//! Every poll the [`Coordinator`] puts the door where the light says it
//! should be, tells the keepers when it moved, and answers any texts that
//! arrived since the last poll. It owns every collaborator and runs on a
//! single thread; only the signal listener runs beside it.

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use std::time::Duration;

use crate::{
    camera::CameraRig,
    comms::{Command, Comms, HELP_TEXT, Keyword},
    door::DoorController,
    io::signals::SignalState,
    solar::{Ephemeris, SolarClock, SunriseEphemeris},
};

const ON_DUTY_HEADLINE: &str = "Coopbot: On duty.";
const OFF_DUTY_TEXT: &str = "Coopbot: Off duty. ";
pub const PHOTOS_TEXT: &str = "Here's photos of the coop. ";
const NO_PHOTOS_TEXT: &str = "Sorry, I couldn't get any photos of the coop right now. ";

/// Parameters for creating a Coordinator.
pub struct CoordinatorParams<E: Ephemeris = SunriseEphemeris> {
    pub clock: SolarClock<E>,
    pub door: DoorController,
    pub camera: CameraRig,
    pub comms: Comms,
    pub poll_interval: Duration,
}

pub struct Coordinator<E: Ephemeris = SunriseEphemeris> {
    clock: SolarClock<E>,
    door: DoorController,
    camera: CameraRig,
    comms: Comms,
    poll_interval: Duration,
}

impl<E: Ephemeris> Coordinator<E> {
    pub fn new(params: CoordinatorParams<E>) -> Self {
        Self {
            clock: params.clock,
            door: params.door,
            camera: params.camera,
            comms: params.comms,
            poll_interval: params.poll_interval,
        }
    }

    pub fn door(&self) -> &DoorController {
        &self.door
    }

    pub fn clock(&self) -> &SolarClock<E> {
        &self.clock
    }

    /// Current instant in the observer's timezone.
    pub fn now(&self) -> DateTime<Tz> {
        crate::time_source::now().with_timezone(&self.clock.timezone())
    }

    /// Door, light and camera reports together.
    pub fn full_report(&self, now: DateTime<Tz>) -> String {
        format!(
            "{}\n{}\n{}\n",
            self.door.report(),
            self.clock.report(now),
            self.camera.report()
        )
    }

    /// Move the door if the light calls for it.
    ///
    /// When the door moved, every recipient gets the full report followed by
    /// photos. Returns the description of the move.
    pub fn reconcile(&mut self, now: DateTime<Tz>) -> Option<String> {
        let moved = if self.clock.is_dark(now) {
            self.door.close_auto()
        } else {
            self.door.open_auto()
        };

        if let Some(text) = &moved {
            self.send_report_and_photos(now, text);
        }
        moved
    }

    /// Answer every pending command. A failing reply does not stop the batch.
    pub fn process_commands(&mut self, now: DateTime<Tz>) {
        for command in self.comms.check_for_commands() {
            if let Err(e) = self.dispatch(&command, now) {
                log_warning!("Failed to answer {}: {e:#}", command.sender);
            }
        }
    }

    /// Carry out one command and reply to its sender.
    pub fn dispatch(&mut self, command: &Command, now: DateTime<Tz>) -> Result<()> {
        let sender = command.sender.as_str();
        match command.keyword {
            Some(Keyword::Photo) => {
                let urls = self.camera.take_and_upload();
                if urls.is_empty() {
                    self.comms.reply(sender, NO_PHOTOS_TEXT, &[])
                } else {
                    self.comms.reply(sender, PHOTOS_TEXT, &urls)
                }
            }
            Some(Keyword::Open) => {
                let text = self.door.open_manual();
                self.comms
                    .reply(sender, &format!("{text}\n{}", self.door.report()), &[])
            }
            Some(Keyword::Close) => {
                let text = self.door.close_manual();
                self.comms
                    .reply(sender, &format!("{text}\n{}", self.door.report()), &[])
            }
            Some(Keyword::Status) => self.comms.reply(sender, &self.full_report(now), &[]),
            Some(Keyword::Door) => self.comms.reply(sender, &self.door.report(), &[]),
            Some(Keyword::Light) => self.comms.reply(sender, &self.clock.report(now), &[]),
            Some(Keyword::Camera) => self.comms.reply(sender, &self.camera.report(), &[]),
            Some(Keyword::Help) | None => self.comms.reply(sender, HELP_TEXT, &[]),
        }
    }

    /// One iteration of the loop, without the sleep.
    pub fn tick(&mut self, now: DateTime<Tz>) {
        self.reconcile(now);
        self.process_commands(now);
    }

    /// Greet the keepers with a full report and photos.
    pub fn start_duty(&mut self) {
        let now = self.now();
        log_block_start!(
            "On duty in {} ({})",
            self.clock.location(),
            self.clock.timezone()
        );
        log_indented!("Door is {} in {} mode", self.door.position(), self.door.mode());
        log_indented!("Polling every {}s", self.poll_interval.as_secs());
        self.clock.log_times(now);

        self.send_report_and_photos(now, ON_DUTY_HEADLINE);
    }

    /// Run until a shutdown signal arrives or a simulation runs out.
    pub fn run(&mut self, signal_state: &SignalState) -> Result<()> {
        self.start_duty();

        loop {
            if !signal_state.is_running() || crate::time_source::simulation_ended() {
                break;
            }

            let now = self.now();
            log_debug!("Tick at {}", now.format("%Y-%m-%d %H:%M:%S %Z"));
            self.tick(now);

            if !signal_state.wait(self.poll_interval) {
                break;
            }
        }

        if crate::time_source::simulation_ended() {
            log_block_start!("Simulation reached its end time");
        }

        self.finish_duty();
        Ok(())
    }

    pub fn finish_duty(&mut self) {
        log_block_start!("Shutting down coopbot...");
        self.comms.send_text(OFF_DUTY_TEXT);
        log_decorated!("Door left {}", self.door.position());
    }

    fn send_report_and_photos(&mut self, now: DateTime<Tz>, headline: &str) {
        self.comms
            .send_text(&format!("{}\n{}", headline.trim_end(), self.full_report(now)));

        let urls = self.camera.take_and_upload();
        if !urls.is_empty() {
            self.comms.send_text_and_photos(PHOTOS_TEXT, &urls);
        }
    }
}
