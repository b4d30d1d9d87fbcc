use crate::model::ids::SubjectId;
use crate::model::subject::Subject;

/// The fixed GATE-ECE syllabus the catalog is seeded from.
///
/// Stores seed these eight subjects once, when the catalog is empty;
/// afterwards the catalog is read-only. Ids are stable so exported
/// attempts keep meaning across re-seeded stores.
#[must_use]
pub fn gate_ece_syllabus() -> Vec<Subject> {
    let entries: [(u64, &str, &str, f64, &[&str]); 8] = [
        (
            1,
            "Engineering Mathematics",
            "EM",
            13.0,
            &[
                "Linear Algebra",
                "Calculus",
                "Differential Equations",
                "Complex Variables",
                "Probability and Statistics",
                "Numerical Methods",
            ],
        ),
        (
            2,
            "Networks, Signals and Systems",
            "NSS",
            13.0,
            &[
                "Network Theorems",
                "Transient Analysis",
                "Two-Port Networks",
                "Continuous-Time Signals",
                "Laplace Transform",
                "Z-Transform",
                "Sampling Theorem",
            ],
        ),
        (
            3,
            "Electronic Devices",
            "EDC",
            8.0,
            &[
                "Semiconductor Physics",
                "PN Junction",
                "BJT",
                "MOSFET",
                "Photodiodes and LEDs",
                "Device Fabrication",
            ],
        ),
        (
            4,
            "Analog Circuits",
            "AC",
            10.0,
            &[
                "Diode Circuits",
                "BJT and MOSFET Amplifiers",
                "Op-Amp Circuits",
                "Feedback Amplifiers",
                "Oscillators",
                "Power Supplies",
            ],
        ),
        (
            5,
            "Digital Circuits",
            "DC",
            9.0,
            &[
                "Boolean Algebra",
                "Combinational Circuits",
                "Sequential Circuits",
                "ADC and DAC",
                "Semiconductor Memories",
                "Microprocessor 8085",
            ],
        ),
        (
            6,
            "Control Systems",
            "CS",
            10.0,
            &[
                "Block Diagrams",
                "Time Response",
                "Routh-Hurwitz Criterion",
                "Root Locus",
                "Bode Plots",
                "State Space Analysis",
            ],
        ),
        (
            7,
            "Communications",
            "COMM",
            12.0,
            &[
                "Amplitude Modulation",
                "Angle Modulation",
                "Random Processes",
                "Digital Modulation",
                "Information Theory",
                "Error Correction",
            ],
        ),
        (
            8,
            "Electromagnetics",
            "EMT",
            10.0,
            &[
                "Maxwell's Equations",
                "Plane Waves",
                "Transmission Lines",
                "Waveguides",
                "Antennas",
                "Optical Fibers",
            ],
        ),
    ];

    entries
        .into_iter()
        .map(|(id, name, code, weightage, topics)| {
            Subject::new(
                SubjectId::new(id),
                name,
                code,
                weightage,
                topics.iter().map(|t| (*t).to_owned()).collect(),
            )
            .expect("syllabus seed data is valid")
        })
        .collect()
}
