//! The control loop
//!
//! One call to [`ControlLoop::poll`] is one iteration:
//!
//! 1. commit a staged configuration
//! 2. read the clock, advance uptime and compute the time of day
//! 3. end an expired pump pulse
//! 4. tick the scheduler and run what is due, in order: measurement
//!    (read sensors, evaluate, apply changed commands), recording,
//!    communication
//!
//! `poll` never blocks. The outer executor decides how long to sleep
//! between iterations, typically [`ControlLoop::next_due_in`].

use heapless::Vec;

use super::events::Event;
use crate::config::{ConfigError, ConfigStore, ControlConfig, RawConfig};
use crate::control::{ActuatorCommands, ControlEngine, Reading};
use crate::record::{Channel, Delivery, Recorder, RECORD_BACKLOG};
use crate::safety::{FaultMonitor, Health};
use crate::scheduler::{DueSet, Scheduler, TimerKind};
use crate::time::{time_of_day, Ticks, Uptime};
use crate::traits::{Actuator, ActuatorSink, Clock, RecordSink, SensorReader};

/// Maximum events reported per iteration
pub const MAX_EVENTS: usize = 16;

/// Outcome of one iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    /// Timers that fired
    pub due: DueSet,
    /// What happened, in order
    pub events: Vec<Event, MAX_EVENTS>,
    /// Health after the iteration
    pub health: Health,
}

/// Sensor-driven control loop
///
/// Owns the configuration store and all collaborators:
/// - `C`: clock
/// - `S`: sensors
/// - `A`: actuators
/// - `P`: persistence sink (recording cadence)
/// - `U`: transport sink (communication cadence)
pub struct ControlLoop<C, S, A, P, U, const N: usize = RECORD_BACKLOG> {
    clock: C,
    sensors: S,
    actuators: A,
    storage: P,
    uplink: U,
    store: ConfigStore,
    scheduler: Scheduler,
    engine: ControlEngine,
    /// Commands the actuators last accepted
    applied: ActuatorCommands,
    storage_recorder: Recorder<N>,
    uplink_recorder: Recorder<N>,
    monitor: FaultMonitor,
    uptime: Uptime,
    /// Latest successful reading
    latest: Option<Reading>,
    /// The most recent measurement failed
    measurement_failed: bool,
    health: Health,
}

impl<C, S, A, P, U, const N: usize> ControlLoop<C, S, A, P, U, N>
where
    C: Clock,
    S: SensorReader,
    A: ActuatorSink,
    P: RecordSink,
    U: RecordSink,
{
    /// Create a new control loop
    ///
    /// Every cadence fires on the first iteration.
    pub fn new(clock: C, sensors: S, actuators: A, storage: P, uplink: U, store: ConfigStore) -> Self {
        let config = *store.active();
        Self {
            clock,
            sensors,
            actuators,
            storage,
            uplink,
            scheduler: Scheduler::new(config.intervals()),
            store,
            engine: ControlEngine::new(),
            applied: ActuatorCommands::OFF,
            storage_recorder: Recorder::new(config.sink_policy),
            uplink_recorder: Recorder::new(config.sink_policy),
            monitor: FaultMonitor::new(),
            uptime: Uptime::new(),
            latest: None,
            measurement_failed: false,
            health: Health::Ok,
        }
    }

    /// Validate and stage a new configuration
    ///
    /// The configuration takes effect at the start of the next iteration.
    /// On error the active configuration stays in force.
    pub fn submit_config(&mut self, raw: RawConfig) -> Result<(), ConfigError> {
        self.store.load(raw).inspect_err(|_| self.monitor.config_rejected())
    }

    /// Get the active configuration
    pub fn config(&self) -> &ControlConfig {
        self.store.active()
    }

    /// Get the configuration store
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Get the scheduler
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Get the control engine
    pub fn engine(&self) -> &ControlEngine {
        &self.engine
    }

    /// Commands the actuators last accepted
    pub fn applied(&self) -> ActuatorCommands {
        self.applied
    }

    /// Get the fault monitor
    pub fn monitor(&self) -> &FaultMonitor {
        &self.monitor
    }

    /// Health after the last iteration
    pub fn health(&self) -> Health {
        self.health
    }

    /// Latest successful reading
    pub fn latest(&self) -> Option<Reading> {
        self.latest
    }

    /// Total uptime at the last iteration
    pub fn uptime(&self) -> u64 {
        self.uptime.total()
    }

    /// Records waiting for a sink
    pub fn backlog_len(&self, channel: Channel) -> usize {
        match channel {
            Channel::Storage => self.storage_recorder.backlog_len(),
            Channel::Uplink => self.uplink_recorder.backlog_len(),
        }
    }

    /// Time until the next cadence is due
    pub fn next_due_in(&self) -> Ticks {
        self.scheduler.next_due_in(self.clock.now())
    }

    /// Get the clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Get mutable access to the clock
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Get mutable access to the sensors
    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    /// Get the actuators
    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    /// Get mutable access to the actuators
    pub fn actuators_mut(&mut self) -> &mut A {
        &mut self.actuators
    }

    /// Get the persistence sink
    pub fn storage(&self) -> &P {
        &self.storage
    }

    /// Get mutable access to the persistence sink
    pub fn storage_mut(&mut self) -> &mut P {
        &mut self.storage
    }

    /// Get the transport sink
    pub fn uplink(&self) -> &U {
        &self.uplink
    }

    /// Get mutable access to the transport sink
    pub fn uplink_mut(&mut self) -> &mut U {
        &mut self.uplink
    }

    /// Run one iteration
    pub fn poll(&mut self) -> Iteration {
        let mut events = Vec::new();

        if let Some(config) = self.store.commit().copied() {
            self.scheduler.set_intervals(config.intervals());
            self.storage_recorder.set_policy(config.sink_policy);
            self.uplink_recorder.set_policy(config.sink_policy);
            let _ = events.push(Event::ConfigApplied);
        }
        let config = *self.store.active();

        let now = self.clock.now();
        let uptime = self.uptime.advance(now);
        let time_of_day = time_of_day(uptime, config.day_offset, config.day_length);

        if self.engine.service(now) {
            debug!("Pump pulse ended at {}", now);
            self.apply(self.engine.commands(), now, &mut events);
        }

        let due = self.scheduler.tick(now);
        for kind in due.iter() {
            match kind {
                TimerKind::Measurement => self.measure(&config, now, time_of_day, &mut events),
                TimerKind::Recording => self.deliver(Channel::Storage, uptime, &mut events),
                TimerKind::Communication => self.deliver(Channel::Uplink, uptime, &mut events),
            }
        }

        let health = self.monitor.check();
        if health != self.health {
            match health {
                Health::Ok => info!("Health restored"),
                Health::Degraded(kind) => warn!("Degraded: {:?}", kind),
            }
            self.health = health;
            let _ = events.push(Event::HealthChanged(health));
        }

        Iteration {
            due,
            events,
            health,
        }
    }

    /// Read the sensors and act on the result
    fn measure(
        &mut self,
        config: &ControlConfig,
        now: Ticks,
        time_of_day: u32,
        events: &mut Vec<Event, MAX_EVENTS>,
    ) {
        match Reading::acquire(&mut self.sensors, self.store.limits()) {
            Ok(reading) => {
                self.monitor.measurement(true);
                self.latest = Some(reading);
                self.measurement_failed = false;

                let previous = self.engine.temperature();
                let decision = self.engine.evaluate(&reading, config, now, time_of_day);
                if decision.temperature != previous {
                    let _ = events.push(Event::TemperatureChanged(decision.temperature));
                }
                self.apply(decision.commands, now, events);
            }
            Err(e) => {
                warn!("Sensor fault: {:?} {:?}", e.quantity, e.fault);
                self.monitor.measurement(false);
                self.measurement_failed = true;
                let _ = events.push(Event::SensorFault(e.quantity, e.fault));
                self.apply(self.engine.hold(), now, events);
            }
        }
    }

    /// Write the commands that differ from what the actuators last accepted
    ///
    /// A rejected write leaves the applied state unchanged, so it is retried
    /// the next time commands are applied.
    fn apply(&mut self, desired: ActuatorCommands, now: Ticks, events: &mut Vec<Event, MAX_EVENTS>) {
        let previous = self.applied;
        for actuator in desired.changes(&previous) {
            let on = desired.get(actuator);
            let result = match actuator {
                Actuator::Lighting => self.actuators.set_lighting(on),
                Actuator::Pump => {
                    let duration = if on {
                        self.engine.pump().remaining(now).unwrap_or(0)
                    } else {
                        0
                    };
                    self.actuators.set_pump(on, duration)
                }
                Actuator::Aeration => self.actuators.set_aeration(on),
            };

            match result {
                Ok(()) => {
                    self.applied.set(actuator, on);
                    let _ = events.push(Event::ActuatorChanged(actuator, on));
                }
                Err(fault) => {
                    warn!("Actuator {:?} rejected command: {:?}", actuator, fault);
                    self.monitor.actuator_fault();
                    let _ = events.push(Event::ActuatorFault(actuator, fault));
                }
            }
        }
    }

    /// Build a record from the latest reading and hand it to a sink
    fn deliver(&mut self, channel: Channel, uptime: u64, events: &mut Vec<Event, MAX_EVENTS>) {
        let reading = match self.latest {
            Some(reading) if !self.measurement_failed => reading,
            _ => {
                debug!("{:?} tick skipped: no valid measurement", channel);
                let _ = events.push(Event::RecordSkipped(channel));
                return;
            }
        };

        let delivery = match channel {
            Channel::Storage => {
                let record = self.storage_recorder.capture(uptime, &reading);
                self.storage_recorder.record(record, &mut self.storage)
            }
            Channel::Uplink => {
                let record = self.uplink_recorder.capture(uptime, &reading);
                self.uplink_recorder.record(record, &mut self.uplink)
            }
        };

        self.report(channel, delivery, events);
    }

    fn report(&mut self, channel: Channel, delivery: Delivery, events: &mut Vec<Event, MAX_EVENTS>) {
        self.monitor.delivery(channel, delivery.fault.is_none());
        self.monitor.records_dropped(delivery.dropped);

        if delivery.sent > 0 {
            let _ = events.push(Event::RecordsSent(channel, saturate(delivery.sent)));
        }
        if let Some(fault) = delivery.fault {
            warn!("{:?} sink fault: {:?}", channel, fault);
            let _ = events.push(Event::SinkFault(channel, fault));
        }
        if delivery.buffered {
            let _ = events.push(Event::RecordBuffered(channel));
        }
        if delivery.dropped > 0 {
            let _ = events.push(Event::RecordsDropped(channel, saturate(delivery.dropped)));
        }
    }
}

fn saturate(count: usize) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SensorLimits, ThermalResponse};
    use crate::control::TempStatus;
    use crate::record::Record;
    use crate::safety::FaultKind;
    use crate::traits::{ActuatorFault, Quantity, SensorFault, SinkFault};

    struct MockClock {
        now: Ticks,
    }

    impl Clock for MockClock {
        fn now(&self) -> Ticks {
            self.now
        }
    }

    struct MockSensors {
        temperature: Result<i32, SensorFault>,
        illuminance: Result<i32, SensorFault>,
        water_level: Result<i32, SensorFault>,
    }

    impl SensorReader for MockSensors {
        fn read_temperature(&mut self) -> Result<i32, SensorFault> {
            self.temperature
        }
        fn read_illuminance(&mut self) -> Result<i32, SensorFault> {
            self.illuminance
        }
        fn read_water_level(&mut self) -> Result<i32, SensorFault> {
            self.water_level
        }
    }

    #[derive(Default)]
    struct MockActuators {
        lighting: bool,
        pump: bool,
        pump_duration: Ticks,
        aeration: bool,
        broken: bool,
        writes: u32,
    }

    impl MockActuators {
        fn write(&mut self) -> Result<(), ActuatorFault> {
            self.writes += 1;
            if self.broken {
                Err(ActuatorFault::Output)
            } else {
                Ok(())
            }
        }
    }

    impl ActuatorSink for MockActuators {
        fn set_lighting(&mut self, on: bool) -> Result<(), ActuatorFault> {
            self.write()?;
            self.lighting = on;
            Ok(())
        }
        fn set_pump(&mut self, on: bool, duration: Ticks) -> Result<(), ActuatorFault> {
            self.write()?;
            self.pump = on;
            self.pump_duration = duration;
            Ok(())
        }
        fn set_aeration(&mut self, on: bool) -> Result<(), ActuatorFault> {
            self.write()?;
            self.aeration = on;
            Ok(())
        }
    }

    struct MockSink {
        online: bool,
        records: Vec<Record, 32>,
    }

    impl RecordSink for MockSink {
        fn emit(&mut self, record: Record) -> Result<(), SinkFault> {
            if !self.online {
                return Err(SinkFault::Unavailable);
            }
            self.records.push(record).map_err(|_| SinkFault::Full)
        }
    }

    type TestLoop = ControlLoop<MockClock, MockSensors, MockActuators, MockSink, MockSink>;

    fn raw_config() -> RawConfig {
        RawConfig {
            ces_dev: 5,
            ces_thd: 25,
            lux_thd: 300,
            led_stat: 1200,
            lec_fins: 600,
            pumping_t: 30,
            measinterval: 10,
            dictinterval: 60,
            recdinterval: 20,
            ..RawConfig::default()
        }
    }

    fn control_loop(raw: RawConfig, start: Ticks) -> TestLoop {
        let store = ConfigStore::new(raw, SensorLimits::default()).unwrap();
        ControlLoop::new(
            MockClock { now: start },
            MockSensors {
                temperature: Ok(25),
                illuminance: Ok(250),
                water_level: Ok(80),
            },
            MockActuators::default(),
            MockSink {
                online: true,
                records: Vec::new(),
            },
            MockSink {
                online: true,
                records: Vec::new(),
            },
            store,
        )
    }

    fn poll_at(control: &mut TestLoop, now: Ticks) -> Iteration {
        control.clock_mut().now = now;
        control.poll()
    }

    #[test]
    fn test_lighting_follows_dark_window() {
        let mut control = control_loop(raw_config(), 0);

        let iteration = poll_at(&mut control, 0);
        assert_eq!(iteration.due.len(), 3);
        assert!(!control.actuators().lighting);
        assert_eq!(
            control.storage().records.as_slice(),
            &[Record {
                run_t: 0,
                ces: 25,
                lux: 250,
                wlv: 80
            }]
        );
        assert_eq!(control.uplink().records.len(), 1);

        let iteration = poll_at(&mut control, 620);
        assert!(iteration.due.contains(TimerKind::Measurement));
        assert!(control.actuators().lighting);
        assert!(iteration
            .events
            .contains(&Event::ActuatorChanged(Actuator::Lighting, true)));
    }

    #[test]
    fn test_sensor_fault_holds_commands() {
        let mut control = control_loop(raw_config(), 620);
        poll_at(&mut control, 620);
        assert!(control.actuators().lighting);
        let writes = control.actuators().writes;

        control.sensors_mut().illuminance = Err(SensorFault::Unavailable);
        let iteration = poll_at(&mut control, 630);
        assert!(iteration
            .events
            .contains(&Event::SensorFault(Quantity::Illuminance, SensorFault::Unavailable)));
        assert!(control.actuators().lighting);
        assert_eq!(control.actuators().writes, writes);

        // Recording tick right after a failed measurement is skipped
        let iteration = poll_at(&mut control, 640);
        assert!(iteration.events.contains(&Event::RecordSkipped(Channel::Storage)));
        assert_eq!(control.storage().records.len(), 1);
    }

    #[test]
    fn test_pump_runs_exact_pulse() {
        let mut raw = raw_config();
        raw.wlv_thd = Some(100);
        let mut control = control_loop(raw, 0);

        poll_at(&mut control, 0);
        assert!(control.actuators().pump);
        assert_eq!(control.actuators().pump_duration, 30);

        control.sensors_mut().water_level = Ok(500);
        poll_at(&mut control, 10);
        poll_at(&mut control, 20);
        poll_at(&mut control, 29);
        assert!(control.actuators().pump);

        let iteration = poll_at(&mut control, 30);
        assert!(!control.actuators().pump);
        assert!(iteration
            .events
            .contains(&Event::ActuatorChanged(Actuator::Pump, false)));
    }

    #[test]
    fn test_pump_expires_during_sensor_fault() {
        let mut raw = raw_config();
        raw.wlv_thd = Some(100);
        let mut control = control_loop(raw, 0);

        poll_at(&mut control, 0);
        control.sensors_mut().water_level = Err(SensorFault::Invalid);
        poll_at(&mut control, 10);
        assert!(control.actuators().pump);

        // Expiry is serviced between measurement ticks too
        poll_at(&mut control, 35);
        assert!(!control.actuators().pump);
    }

    fn pump_switches(control: &mut TestLoop, times: impl Iterator<Item = Ticks>) -> (u32, u32) {
        let mut starts = 0;
        let mut stops = 0;
        for now in times {
            for event in poll_at(control, now).events.iter() {
                match event {
                    Event::ActuatorChanged(Actuator::Pump, true) => starts += 1,
                    Event::ActuatorChanged(Actuator::Pump, false) => stops += 1,
                    _ => {}
                }
            }
        }
        (starts, stops)
    }

    #[test]
    fn test_stuck_low_level_pumps_once() {
        let mut raw = raw_config();
        raw.wlv_thd = Some(100);
        let mut control = control_loop(raw, 0);
        control.sensors_mut().water_level = Ok(50);

        assert_eq!(pump_switches(&mut control, (0..=300).step_by(10)), (1, 1));
        assert!(!control.actuators().pump);

        // Recovery re-arms the pump for the next low reading
        control.sensors_mut().water_level = Ok(150);
        poll_at(&mut control, 310);
        control.sensors_mut().water_level = Ok(50);
        poll_at(&mut control, 320);
        assert!(control.actuators().pump);
    }

    #[test]
    fn test_stuck_low_level_pumps_after_rest() {
        let mut raw = raw_config();
        raw.wlv_thd = Some(100);
        raw.pump_rest = 100;
        let mut control = control_loop(raw, 0);
        control.sensors_mut().water_level = Ok(50);

        // Pulses start at 0 and 130, each ending after 30
        assert_eq!(pump_switches(&mut control, (0..=250).step_by(10)), (2, 2));
        assert!(!control.actuators().pump);
    }

    #[test]
    fn test_rejected_config_keeps_active() {
        let mut control = control_loop(raw_config(), 0);

        let mut bad = raw_config();
        bad.measinterval = 0;
        assert_eq!(
            control.submit_config(bad),
            Err(ConfigError::NonPositiveInterval(TimerKind::Measurement))
        );
        assert_eq!(control.monitor().counts().config, 1);

        let mut good = raw_config();
        good.measinterval = 5;
        control.submit_config(good).unwrap();
        assert_eq!(control.config().measinterval, 10);

        let iteration = poll_at(&mut control, 0);
        assert_eq!(iteration.events.first(), Some(&Event::ConfigApplied));
        assert_eq!(control.config().measinterval, 5);
        assert_eq!(control.scheduler().intervals().measurement, 5);
    }

    #[test]
    fn test_failed_actuator_write_retried() {
        let mut control = control_loop(raw_config(), 620);
        control.actuators_mut().broken = true;

        let iteration = poll_at(&mut control, 620);
        assert!(iteration
            .events
            .contains(&Event::ActuatorFault(Actuator::Lighting, ActuatorFault::Output)));
        assert!(!control.applied().lighting);

        control.actuators_mut().broken = false;
        poll_at(&mut control, 630);
        assert!(control.actuators().lighting);
        assert!(control.applied().lighting);
    }

    #[test]
    fn test_backlog_flushed_when_sink_returns() {
        let mut control = control_loop(raw_config(), 0);
        control.storage_mut().online = false;

        let iteration = poll_at(&mut control, 0);
        assert!(iteration.events.contains(&Event::RecordBuffered(Channel::Storage)));
        poll_at(&mut control, 20);
        assert_eq!(control.backlog_len(Channel::Storage), 2);

        control.storage_mut().online = true;
        let iteration = poll_at(&mut control, 40);
        assert!(iteration.events.contains(&Event::RecordsSent(Channel::Storage, 3)));
        let times: Vec<u64, 4> = control.storage().records.iter().map(|r| r.run_t).collect();
        assert_eq!(times.as_slice(), &[0, 20, 40]);
    }

    #[test]
    fn test_degraded_after_repeated_sensor_faults() {
        let mut control = control_loop(raw_config(), 0);
        control.sensors_mut().temperature = Err(SensorFault::Unavailable);

        poll_at(&mut control, 0);
        poll_at(&mut control, 10);
        let iteration = poll_at(&mut control, 20);
        assert_eq!(iteration.health, Health::Degraded(FaultKind::Sensor));
        assert!(iteration
            .events
            .contains(&Event::HealthChanged(Health::Degraded(FaultKind::Sensor))));

        control.sensors_mut().temperature = Ok(25);
        let iteration = poll_at(&mut control, 30);
        assert_eq!(iteration.health, Health::Ok);
    }

    #[test]
    fn test_run_t_continues_across_clock_wrap() {
        let mut control = control_loop(raw_config(), u32::MAX - 5);
        poll_at(&mut control, u32::MAX - 5);
        poll_at(&mut control, 14);

        let records = &control.storage().records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].run_t, (u32::MAX - 5) as u64);
        assert_eq!(records[1].run_t, u32::MAX as u64 + 15);
    }

    #[test]
    fn test_excursion_reported_and_actuated() {
        let mut raw = raw_config();
        raw.thermal = ThermalResponse::AerateWhenHigh;
        let mut control = control_loop(raw, 0);

        control.sensors_mut().temperature = Ok(30);
        let iteration = poll_at(&mut control, 0);
        assert!(iteration
            .events
            .contains(&Event::TemperatureChanged(TempStatus::High)));
        assert!(control.actuators().aeration);

        control.sensors_mut().temperature = Ok(25);
        let iteration = poll_at(&mut control, 10);
        assert!(iteration
            .events
            .contains(&Event::TemperatureChanged(TempStatus::Nominal)));
        assert!(!control.actuators().aeration);
    }

    #[test]
    fn test_next_due_in() {
        let mut control = control_loop(raw_config(), 0);
        assert_eq!(control.next_due_in(), 0);
        poll_at(&mut control, 0);
        control.clock_mut().now = 4;
        assert_eq!(control.next_due_in(), 6);
    }
}
