//! Relay outputs
//!
//! Lighting, pump and aeration switched through GPIO-driven relays, SSRs
//! or MOSFETs. Each relay can be active-high (default) or active-low.

use embedded_hal::digital::OutputPin;
use phyto_core::time::Ticks;
use phyto_core::traits::{ActuatorFault, ActuatorSink};

/// Single relay output
pub struct Relay<P> {
    pin: P,
    /// If true, relay ON = pin LOW
    inverted: bool,
    /// Last state the pin accepted
    on: bool,
}

impl<P: OutputPin> Relay<P> {
    /// Create a new relay output, switched off
    ///
    /// Fails if the pin rejects the initial off write, so a relay that
    /// exists is always known to be off.
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin driving the relay
    /// - `inverted`: If true, the relay is ON when the pin is LOW
    pub fn new(pin: P, inverted: bool) -> Result<Self, ActuatorFault> {
        let mut relay = Self {
            pin,
            inverted,
            on: false,
        };
        relay.set(false)?;
        Ok(relay)
    }

    /// Create a relay with active-high output
    pub fn new_active_high(pin: P) -> Result<Self, ActuatorFault> {
        Self::new(pin, false)
    }

    /// Create a relay with active-low output
    pub fn new_active_low(pin: P) -> Result<Self, ActuatorFault> {
        Self::new(pin, true)
    }

    /// Switch the relay
    pub fn set(&mut self, on: bool) -> Result<(), ActuatorFault> {
        let result = if on != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| ActuatorFault::Output)?;
        self.on = on;
        Ok(())
    }

    /// Check if the relay is on
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Release the pin
    pub fn release(self) -> P {
        self.pin
    }
}

/// Relays for every actuator
///
/// Aeration is optional; a bank without it reports
/// [`ActuatorFault::NotFitted`] when asked to switch it on.
pub struct RelayBank<L, W, A> {
    lighting: Relay<L>,
    pump: Relay<W>,
    aeration: Option<Relay<A>>,
}

impl<L: OutputPin, W: OutputPin, A: OutputPin> RelayBank<L, W, A> {
    /// Create a new relay bank
    pub fn new(lighting: Relay<L>, pump: Relay<W>, aeration: Option<Relay<A>>) -> Self {
        Self {
            lighting,
            pump,
            aeration,
        }
    }

    /// Get the lighting relay
    pub fn lighting(&self) -> &Relay<L> {
        &self.lighting
    }

    /// Get the pump relay
    pub fn pump(&self) -> &Relay<W> {
        &self.pump
    }

    /// Get the aeration relay, if fitted
    pub fn aeration(&self) -> Option<&Relay<A>> {
        self.aeration.as_ref()
    }
}

impl<L: OutputPin, W: OutputPin, A: OutputPin> ActuatorSink for RelayBank<L, W, A> {
    fn set_lighting(&mut self, on: bool) -> Result<(), ActuatorFault> {
        self.lighting.set(on)
    }

    fn set_pump(&mut self, on: bool, _duration: Ticks) -> Result<(), ActuatorFault> {
        // A plain relay cannot time itself; the control loop switches it off
        self.pump.set(on)
    }

    fn set_aeration(&mut self, on: bool) -> Result<(), ActuatorFault> {
        match self.aeration.as_mut() {
            Some(relay) => relay.set(on),
            None if on => Err(ActuatorFault::NotFitted),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Mock GPIO pin for testing
    struct MockPin {
        high: bool,
    }

    impl MockPin {
        fn new() -> Self {
            Self { high: false }
        }
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }
    }

    /// Pin whose driver fails once `broken` is set
    struct FlakyPin {
        high: bool,
        broken: bool,
    }

    impl FlakyPin {
        fn broken() -> Self {
            Self {
                high: true,
                broken: true,
            }
        }

        fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.high = high;
            Ok(())
        }
    }

    impl ErrorType for FlakyPin {
        type Error = ErrorKind;
    }

    impl OutputPin for FlakyPin {
        fn set_high(&mut self) -> Result<(), ErrorKind> {
            self.write(true)
        }

        fn set_low(&mut self) -> Result<(), ErrorKind> {
            self.write(false)
        }
    }

    #[test]
    fn test_active_high_relay() {
        let mut relay = Relay::new_active_high(MockPin::new()).unwrap();

        // Initially off
        assert!(!relay.is_on());
        assert!(!relay.pin.high);

        relay.set(true).unwrap();
        assert!(relay.is_on());
        assert!(relay.pin.high);

        relay.set(false).unwrap();
        assert!(!relay.is_on());
        assert!(!relay.pin.high);
    }

    #[test]
    fn test_active_low_relay() {
        let mut relay = Relay::new_active_low(MockPin::new()).unwrap();

        // Initially off (pin is high for active-low)
        assert!(!relay.is_on());
        assert!(relay.pin.high);

        relay.set(true).unwrap();
        assert!(relay.is_on());
        assert!(!relay.pin.high);
    }

    #[test]
    fn test_failed_initial_write_rejected() {
        assert_eq!(
            Relay::new_active_high(FlakyPin::broken()).err(),
            Some(ActuatorFault::Output)
        );
        assert_eq!(
            Relay::new_active_low(FlakyPin::broken()).err(),
            Some(ActuatorFault::Output)
        );
    }

    #[test]
    fn test_failed_write_keeps_state() {
        let mut relay = Relay::new_active_high(FlakyPin {
            high: true,
            broken: false,
        })
        .unwrap();
        assert!(!relay.pin.high);

        relay.pin.broken = true;
        assert_eq!(relay.set(true), Err(ActuatorFault::Output));
        assert!(!relay.is_on());

        relay.pin.broken = false;
        relay.set(true).unwrap();
        relay.pin.broken = true;
        assert_eq!(relay.set(false), Err(ActuatorFault::Output));
        assert!(relay.is_on());
    }

    #[test]
    fn test_bank_as_actuator_sink() {
        let mut bank: RelayBank<MockPin, MockPin, MockPin> = RelayBank::new(
            Relay::new_active_high(MockPin::new()).unwrap(),
            Relay::new_active_low(MockPin::new()).unwrap(),
            None,
        );

        fn drive<A: ActuatorSink>(sink: &mut A) {
            sink.set_lighting(true).unwrap();
            sink.set_pump(true, 30).unwrap();
            assert_eq!(sink.set_aeration(true), Err(ActuatorFault::NotFitted));
            assert_eq!(sink.set_aeration(false), Ok(()));
        }

        drive(&mut bank);
        assert!(bank.lighting().is_on());
        assert!(bank.pump().is_on());
        assert!(!bank.pump().pin.high);
        assert!(bank.aeration().is_none());
    }
}
