/// Sensor column registry for solar monitoring stations.
///
/// Defines the canonical columns a solar-station export carries, with
/// their units and physical bounds. This is the single source of truth for
/// default clipping ranges: `RangeSpec::physical_defaults` is built from
/// here rather than hardcoding bounds at call sites.

// ---------------------------------------------------------------------------
// Sensor metadata
// ---------------------------------------------------------------------------

/// Broad grouping of a sensor column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Solar radiation; negative readings are physically meaningless and
    /// usually a nighttime calibration offset.
    Irradiance,
    Temperature,
    Humidity,
    Wind,
    Pressure,
    Precipitation,
    /// Cleaning event indicator (0/1).
    Maintenance,
}

/// Metadata for a single sensor column.
pub struct Sensor {
    /// Column header as it appears in station exports.
    pub name: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
    pub kind: SensorKind,
    /// Inclusive physical (min, max) bounds used for clipping.
    pub bounds: (f64, f64),
}

/// All sensor columns found in the standard solar-station exports.
pub static SENSOR_REGISTRY: &[Sensor] = &[
    Sensor {
        name: "GHI",
        unit: "W/m²",
        description: "Global Horizontal Irradiance: total solar radiation on a horizontal surface.",
        kind: SensorKind::Irradiance,
        bounds: (0.0, 1500.0),
    },
    Sensor {
        name: "DNI",
        unit: "W/m²",
        description: "Direct Normal Irradiance: beam radiation on a surface facing the sun.",
        kind: SensorKind::Irradiance,
        bounds: (0.0, 1400.0),
    },
    Sensor {
        name: "DHI",
        unit: "W/m²",
        description: "Diffuse Horizontal Irradiance: scattered sky radiation.",
        kind: SensorKind::Irradiance,
        bounds: (0.0, 1000.0),
    },
    Sensor {
        name: "ModA",
        unit: "W/m²",
        description: "Irradiance measured by module sensor A.",
        kind: SensorKind::Irradiance,
        bounds: (0.0, 1500.0),
    },
    Sensor {
        name: "ModB",
        unit: "W/m²",
        description: "Irradiance measured by module sensor B.",
        kind: SensorKind::Irradiance,
        bounds: (0.0, 1500.0),
    },
    Sensor {
        name: "Tamb",
        unit: "°C",
        description: "Ambient air temperature.",
        kind: SensorKind::Temperature,
        bounds: (-40.0, 60.0),
    },
    Sensor {
        name: "RH",
        unit: "%",
        description: "Relative humidity.",
        kind: SensorKind::Humidity,
        bounds: (0.0, 100.0),
    },
    Sensor {
        name: "WS",
        unit: "m/s",
        description: "Wind speed.",
        kind: SensorKind::Wind,
        bounds: (0.0, 60.0),
    },
    Sensor {
        name: "WSgust",
        unit: "m/s",
        description: "Maximum wind gust speed.",
        kind: SensorKind::Wind,
        bounds: (0.0, 75.0),
    },
    Sensor {
        name: "WSstdev",
        unit: "m/s",
        description: "Standard deviation of wind speed over the interval.",
        kind: SensorKind::Wind,
        bounds: (0.0, 20.0),
    },
    Sensor {
        name: "WD",
        unit: "°N",
        description: "Wind direction, degrees from north.",
        kind: SensorKind::Wind,
        bounds: (0.0, 360.0),
    },
    Sensor {
        name: "WDstdev",
        unit: "°",
        description: "Standard deviation of wind direction over the interval.",
        kind: SensorKind::Wind,
        bounds: (0.0, 180.0),
    },
    Sensor {
        name: "BP",
        unit: "hPa",
        description: "Barometric pressure.",
        kind: SensorKind::Pressure,
        bounds: (850.0, 1100.0),
    },
    Sensor {
        name: "Cleaning",
        unit: "1/0",
        description: "Whether the module sensors were cleaned at this reading.",
        kind: SensorKind::Maintenance,
        bounds: (0.0, 1.0),
    },
    Sensor {
        name: "Precipitation",
        unit: "mm/min",
        description: "Precipitation rate.",
        kind: SensorKind::Precipitation,
        bounds: (0.0, 50.0),
    },
    Sensor {
        name: "TModA",
        unit: "°C",
        description: "Back-of-module temperature, sensor A.",
        kind: SensorKind::Temperature,
        bounds: (-40.0, 100.0),
    },
    Sensor {
        name: "TModB",
        unit: "°C",
        description: "Back-of-module temperature, sensor B.",
        kind: SensorKind::Temperature,
        bounds: (-40.0, 100.0),
    },
];

/// Looks up a sensor by column name. Returns `None` if not found.
pub fn find_sensor(name: &str) -> Option<&'static Sensor> {
    SENSOR_REGISTRY.iter().find(|s| s.name == name)
}

/// Column names of every irradiance sensor, in registry order.
pub fn irradiance_columns() -> Vec<&'static str> {
    SENSOR_REGISTRY
        .iter()
        .filter(|s| s.kind == SensorKind::Irradiance)
        .map(|s| s.name)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
