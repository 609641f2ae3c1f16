//! SenML unit symbols
//!
//! The RFC 8428 unit registry as a closed enum. Wire formats always carry the
//! short symbol string (`"Cel"`, `"m/s"`, ...); this table maps both ways.

macro_rules! senml_units {
    ($($(#[$meta:meta])* $variant:ident => $symbol:literal,)+) => {
        /// A unit from the RFC 8428 unit registry
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum SenMLUnit {
            $($(#[$meta])* $variant,)+
        }

        impl SenMLUnit {
            /// The short symbol string used on the wire
            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Self::$variant => $symbol,)+
                }
            }

            /// Look up a unit by its wire symbol
            pub fn from_symbol(symbol: &str) -> Option<Self> {
                match symbol {
                    $($symbol => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

senml_units! {
    Meter => "m",
    Kilogram => "kg",
    Gram => "g",
    Second => "s",
    Ampere => "A",
    Kelvin => "K",
    Candela => "cd",
    Mole => "mol",
    Hertz => "Hz",
    Radian => "rad",
    Steradian => "sr",
    Newton => "N",
    Pascal => "Pa",
    Joule => "J",
    Watt => "W",
    Coulomb => "C",
    Volt => "V",
    Farad => "F",
    Ohm => "Ohm",
    Siemens => "S",
    Weber => "Wb",
    Tesla => "T",
    Henry => "H",
    Celsius => "Cel",
    Lumen => "lm",
    Lux => "lx",
    Becquerel => "Bq",
    Gray => "Gy",
    Sievert => "Sv",
    Katal => "kat",
    SquareMeter => "m2",
    CubicMeter => "m3",
    Liter => "l",
    MeterPerSecond => "m/s",
    MeterPerSquareSecond => "m/s2",
    CubicMeterPerSecond => "m3/s",
    LiterPerSecond => "l/s",
    WattPerSquareMeter => "W/m2",
    CandelaPerSquareMeter => "cd/m2",
    Bit => "bit",
    BitPerSecond => "bit/s",
    Latitude => "lat",
    Longitude => "lon",
    Ph => "pH",
    Decibel => "dB",
    DecibelRelativeToWatt => "dBW",
    Bel => "Bel",
    Count => "count",
    Ratio => "/",
    Percent => "%",
    PercentRelativeHumidity => "%RH",
    PercentBatteryLevel => "%EL",
    SecondsBatteryLevel => "EL",
    EventRatePerSecond => "1/s",
    EventRatePerMinute => "1/min",
    BeatPerMinute => "beat/min",
    Beats => "beats",
    SiemensPerMeter => "S/m",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(SenMLUnit::Celsius.symbol(), "Cel");
        assert_eq!(SenMLUnit::from_symbol("Cel"), Some(SenMLUnit::Celsius));
        assert_eq!(SenMLUnit::from_symbol("m/s2"), Some(SenMLUnit::MeterPerSquareSecond));
        assert_eq!(SenMLUnit::from_symbol("furlong"), None);
    }

    #[test]
    fn test_symbols_are_unique() {
        // The ratio units share semantics but not symbols
        assert_ne!(SenMLUnit::Ratio.symbol(), SenMLUnit::Percent.symbol());
    }
}
