//! Declarative field catalog.
//!
//! Every source field the document reads is listed here, either as a [`LeafRule`] (a plain
//! presence-gated leaf evaluated generically by the builder) or as a row of one of the
//! fixed-cardinality slot tables. Builders hold the structure; this module holds the ids.

use crate::constants::{VOCAB_DISTRICTS, VOCAB_WHODRUG_COVID};

// ============================================================================
// Leaf rules
// ============================================================================

/// Where a leaf reads its raw value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Attribute(&'static str),
    Observation(&'static str),
}

/// How a present raw value becomes an answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafKind {
    /// Free text, passed through.
    Text,
    /// Date, passed through as supplied.
    Date,
    /// Time of day, normalised to ISO local time. Unparseable input is fatal.
    Time,
    /// Whole number. Unparseable input is fatal.
    Integer,
    /// `1`/`2`/`3` coded as yes/no/unknown. Other codes leave the leaf absent.
    Ternary,
    /// Boolean text coded as yes/no.
    BooleanTernary,
    /// Display label from a vocabulary set. The code must be in the set.
    Label(&'static str),
    /// Display label from a vocabulary set, falling back to the raw code.
    LabelOrCode(&'static str),
    /// One-way digest of the value.
    Pseudonym,
}

/// One presence-gated leaf: absent source value means absent node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafRule {
    pub link_id: &'static str,
    pub source: Source,
    pub kind: LeafKind,
}

impl LeafRule {
    pub const fn attribute(link_id: &'static str, field: &'static str, kind: LeafKind) -> Self {
        Self {
            link_id,
            source: Source::Attribute(field),
            kind,
        }
    }

    pub const fn observation(link_id: &'static str, field: &'static str, kind: LeafKind) -> Self {
        Self {
            link_id,
            source: Source::Observation(field),
            kind,
        }
    }
}

// ============================================================================
// Notification and patient
// ============================================================================

pub const CASE_NUMBER: &str = "KSr2yTdu1AI";
pub const PATIENT_IDENTIFIER: &str = "Ewi7FUfcHAD";
pub const RESIDENCE: &str = "eISp65Kw0Z7";
pub const SEX: &str = "oindugucx72";
pub const BIRTH_DATE: &str = "NI0QRzJvQ0k";
pub const REPORTER_PROFESSION: &str = "Tgi4xP5DCzr";
pub const CONSULTATION_DATE: &str = "PW0dQpcY2wD";

pub const CONSULTATION_DATE_LEAF: LeafRule =
    LeafRule::observation("fechaConsulta", CONSULTATION_DATE, LeafKind::Date);

/// Leaves filled from the report completion date.
pub const COMPLETION_DATE_LINK_IDS: [&str; 3] =
    ["fechaNotificacion", "fechaLlenadoFicha", "fechaRepoNacional"];

pub const CASE_NUMBER_LEAF: LeafRule =
    LeafRule::attribute("numeroCaso", CASE_NUMBER, LeafKind::Text);
pub const PATIENT_IDENTIFIER_LEAF: LeafRule =
    LeafRule::attribute("idPaciente", PATIENT_IDENTIFIER, LeafKind::Pseudonym);
pub const RESIDENCE_LEAF: LeafRule = LeafRule::attribute(
    "nombreResidenciaHabitual",
    RESIDENCE,
    LeafKind::Label(VOCAB_DISTRICTS),
);
pub const BIRTH_DATE_LEAF: LeafRule =
    LeafRule::attribute("fechaNacimiento", BIRTH_DATE, LeafKind::Date);

// ============================================================================
// Medical history
// ============================================================================

/// Prior illnesses, one MedDRA code per slot.
pub const PRIOR_ILLNESS_SLOTS: [&str; 9] = [
    "qefbRP79xOR",
    "AFZZf15RB9H",
    "IHAuvjbCaiq",
    "q5gX7VOf0LI",
    "j6J8gLoFePq",
    "Fm78gKjGygn",
    "ZKn2LDznlHd",
    "FUxdYjcINIh",
    "j9yee5ZTdyE",
];

pub const ADVERSE_HISTORY_LEAVES: [LeafRule; 3] = [
    LeafRule::observation("antecedentesAdvSimilar", "IdCrdz34ZBK", LeafKind::Ternary),
    LeafRule::observation("alergiaMedicamentos", "rgVs3pWqzx2", LeafKind::Ternary),
    LeafRule::observation("alergiaVacunas", "CywpFDbxPqH", LeafKind::Ternary),
];

pub const SARS_COV2_LEAVES: [LeafRule; 1] = [LeafRule::observation(
    "diagnosticoprevioSarsCov2",
    "XBU8oloqd7i",
    LeafKind::Ternary,
)];

pub const PREGNANCY_LEAVES: [LeafRule; 5] = [
    LeafRule::observation("embarazadaMomentoVacuna", "U19JzF3LjsS", LeafKind::Ternary),
    LeafRule::observation("embarazadaMomentoESAVI", "ZzoWAqln5xc", LeafKind::Ternary),
    LeafRule::observation("fechaUltimaMenstruacion", "oCKpt0i7VeZ", LeafKind::Date),
    LeafRule::observation("fechaProbableParto", "mfGQRlcG7cc", LeafKind::Date),
    LeafRule::observation(
        "monitoreoPosteriorVacuna",
        "Nl96399itF0",
        LeafKind::BooleanTernary,
    ),
];

// ============================================================================
// Medications and vaccines
// ============================================================================

/// One concomitant-medication slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MedicationSlot {
    pub drug: &'static str,
    pub form: &'static str,
    pub route: &'static str,
}

const fn medication(drug: &'static str, form: &'static str, route: &'static str) -> MedicationSlot {
    MedicationSlot { drug, form, route }
}

pub const MEDICATION_SLOTS: [MedicationSlot; 10] = [
    medication("YDhHKT2hE8j", "LaStdK115NF", "B9HiK1fADgK"),
    medication("YzZ5iOPzR6k", "cBKqulUmt9b", "FKgkFwKpjfu"),
    medication("i7ylwQssbZs", "wNzChKbsxd0", "QzkGC9PeXNe"),
    medication("xbrWBpcL7Mc", "kxFDJmHFX2j", "SznBvVkfQxc"),
    medication("CvJTcYvJxMX", "CMSNZVmLxGq", "pymdeJkXNWZ"),
    medication("j69skZQLxJR", "HFnr2nf6VC6", "mBJnveQPhMK"),
    medication("HAz2UIdgtPe", "aHFjm75ialS", "fgoMOIvotYF"),
    medication("lwSV5ilPBbQ", "rqg6Z6aOU20", "GqdK5VSSC0q"),
    medication("VidbwCnSw2X", "ZTlbQp6AUxR", "LI1ea2cTRNw"),
    medication("nKWV4cjQ9lR", "p7VnQrQyGEl", "eEmvhkIOSKm"),
];

/// One administered-vaccine slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VaccineSlot {
    pub position: i64,
    pub vaccine: &'static str,
    pub manufacturer: &'static str,
    pub dose_number: &'static str,
    pub batch: &'static str,
    pub expiry_date: &'static str,
    pub vaccination_date: &'static str,
    pub vaccination_time: &'static str,
    pub reconstitution_date: &'static str,
    pub reconstitution_time: &'static str,
    pub diluent: &'static str,
    pub diluent_batch: &'static str,
    pub diluent_expiry_date: &'static str,
}

pub const VACCINE_SLOTS: [VaccineSlot; 4] = [
    VaccineSlot {
        position: 1,
        vaccine: "uSVcZzSM3zg",
        manufacturer: "JSd0HQOgJ8w",
        dose_number: "LIyV4t7eCfZ",
        batch: "LNqkAlvGplL",
        expiry_date: "VFrc8SNFYm7",
        vaccination_date: "dOkuCjpD978",
        vaccination_time: "BSUncNBb20j",
        reconstitution_date: "om7AsREDduc",
        reconstitution_time: "zIKVrYHtdUx",
        diluent: "xk9QvZPMVQF",
        diluent_batch: "FQM2ksIQix8",
        diluent_expiry_date: "cKx0VCmLrsc",
    },
    VaccineSlot {
        position: 2,
        vaccine: "g9PjywVj2fs",
        manufacturer: "eRwc8Y0CNLh",
        dose_number: "E3F414izniN",
        batch: "b1rSwGRcY5W",
        expiry_date: "rVUo2PBgwhr",
        vaccination_date: "VrzEutEnzSJ",
        vaccination_time: "fZFQVZFqu0q",
        reconstitution_date: "xXjnT9sjt4F",
        reconstitution_time: "KTHsZhIAGWf",
        diluent: "WN8844HG0zi",
        diluent_batch: "ufWU3WStZgG",
        diluent_expiry_date: "FcqNLPNUPId",
    },
    VaccineSlot {
        position: 3,
        vaccine: "OU5klvkk3SM",
        manufacturer: "wdZrkUvnuyr",
        dose_number: "WlE0K4xCc14",
        batch: "YBnFoNouH6f",
        expiry_date: "ffYfdSPmM1W",
        vaccination_date: "f4WCAVwjHz0",
        vaccination_time: "VQKdZ1KeD7u",
        reconstitution_date: "fW6RbpJk4hS",
        reconstitution_time: "gG0FZYpEctJ",
        diluent: "pLu0luPWikb",
        diluent_batch: "MLP8fi1X7UX",
        diluent_expiry_date: "MGjnXmtmd7l",
    },
    VaccineSlot {
        position: 4,
        vaccine: "menOXwIFZh5",
        manufacturer: "Ptms0lmt4QX",
        dose_number: "Aya8C25DXHe",
        batch: "BHAfwo6JPDa",
        expiry_date: "ZfjyIKeX1AN",
        vaccination_date: "H3TKHMFIN6V",
        vaccination_time: "S1PRFSk8Y9v",
        reconstitution_date: "va0Smpy0LUn",
        reconstitution_time: "EDdd0HsfLcO",
        diluent: "ZTyN8vSf7bc",
        diluent_batch: "MyWtDaOdlyD",
        diluent_expiry_date: "qhDonTAIjl0",
    },
];

/// Vaccination site, shared by every vaccine slot.
pub const VACCINATION_SITE: &str = "AIbRRSIHSqY";

/// Verification mechanism, reported on the first vaccine slot only.
pub const VERIFICATION_MECHANISM: &str = "QvLFXpsCWAd";
pub const OTHER_VERIFICATION_MECHANISM: &str = "F1sQvGLtfEw";

/// Vaccine name leaves; both labels fall back to the raw code.
pub const fn vaccine_name_leaves(slot: &VaccineSlot) -> [LeafRule; 2] {
    [
        LeafRule::observation(
            "nombreVacuna",
            slot.vaccine,
            LeafKind::LabelOrCode(VOCAB_WHODRUG_COVID),
        ),
        LeafRule::observation(
            "nombreNormalizadoVacuna",
            slot.vaccine,
            LeafKind::LabelOrCode(VOCAB_WHODRUG_COVID),
        ),
    ]
}

// ============================================================================
// ESAVI registration
// ============================================================================

/// One reported adverse-event slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdverseEventSlot {
    pub position: i64,
    pub event: &'static str,
    pub start_date: &'static str,
    pub start_time: &'static str,
}

const fn adverse_event(
    position: i64,
    event: &'static str,
    start_date: &'static str,
    start_time: &'static str,
) -> AdverseEventSlot {
    AdverseEventSlot {
        position,
        event,
        start_date,
        start_time,
    }
}

pub const ADVERSE_EVENT_SLOTS: [AdverseEventSlot; 6] = [
    adverse_event(1, "PZxZirhNzgS", "LYariSd5cEq", "mqCTfs4jXSo"),
    adverse_event(2, "maY0Vi68Fv9", "hfdzpv7lP6C", "hc15z2mXm2o"),
    adverse_event(3, "Sy1uqYvgR3r", "oHVQ23x5NQE", "DBV8wfaQCMt"),
    adverse_event(4, "Og99AH5tIQz", "OGRWlduylFk", "NuwfTxCxvca"),
    adverse_event(5, "vqf60JfNqsf", "QeXeXYdBAUE", "XQjZ1N8dNkt"),
    adverse_event(6, "pQJc4VA2SDW", "MfgJjmoOdxm", "kDgoKxw8sVJ"),
];

/// Free-text description shared by every adverse-event slot.
pub const ADVERSE_EVENT_DESCRIPTION: &str = "ci3S3BH6wZn";

pub const PREGNANCY_COMPLICATION_LEAVES: [LeafRule; 1] = [LeafRule::observation(
    "nombreComplicacionEmbarazoESAVI",
    "M8T2c8RJFUA",
    LeafKind::Text,
)];

/// Governing "is serious" flag.
pub const SERIOUS: &str = "fq1c1A3EOX5";

/// Seriousness criteria, each emitted only when its own flag is true.
pub const SERIOUSNESS_CRITERIA: [(&str, &str); 8] = [
    ("gravMuerte", "DOA6ZFMro84"),
    ("gravRiesgoVida", "lATDYNmTLKD"),
    ("gravDiscapacidad", "lsO8n8ZmLAB"),
    ("gravHospitalizacion", "Il1lTfknLdd"),
    ("gravAnomaliaCongenita", "lSBsxcQU0kO"),
    ("gravAborto", "ggjKwDKEwbP"),
    ("gravMuerteFetal", "IEOkkWbZwB0"),
    ("otrosEventosImportantes", "VXdRoWQOBxG"),
];

/// Shares its source field with [`DEATH_DATE_LEAF`].
pub const OTHER_IMPORTANT_EVENTS_TEXT_LEAF: LeafRule =
    LeafRule::observation("otrosEventosImportantesTx", "TKikUtqJQTq", LeafKind::Text);

pub const OUTCOME: &str = "yRrSDiR5v1M";
pub const AUTOPSY: &str = "YUcJrLWmGyv";
pub const VERBAL_AUTOPSY: &str = "CYZNXLLeOr6";

pub const DEATH_DATE_LEAF: LeafRule =
    LeafRule::observation("fechaMuerte", "TKikUtqJQTq", LeafKind::Date);
pub const INVESTIGATION_START_LEAF: LeafRule =
    LeafRule::observation("fechaInicioInvestigacion", "e8ltdHdx90O", LeafKind::Date);

/// One WHO-AEFI causality category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CausalityCategory {
    pub field: &'static str,
    pub code: &'static str,
    pub display: &'static str,
}

pub const CAUSALITY_CATEGORIES: [CausalityCategory; 8] = [
    CausalityCategory {
        field: "tIHAJAXcDev",
        code: "A1",
        display: "Evento relacionado con la vacuna o cualquiera de sus componentes",
    },
    CausalityCategory {
        field: "vIk1r0MRmBh",
        code: "A2",
        display: "Evento relacionado con una desviacion de calidad del producto biologico o la vacuna",
    },
    CausalityCategory {
        field: "bNjv960SqRX",
        code: "A3",
        display: "Evento relacionado con un error programatico",
    },
    CausalityCategory {
        field: "NsjdL0Z0fIn",
        code: "A4",
        display: "Evento por estres que tuvo lugar inmediatemente antes, durante o inmediatamente despues del proceso de vacunacion",
    },
    CausalityCategory {
        field: "dzYVg6O3ms5",
        code: "B1",
        display: "La relacion temporal es congruente, pero no hay evidencia definitiva suficiente sobre una relacion causal con la vacuna (puede ser un evento recientemente asociadoa la vacuna [señal])",
    },
    CausalityCategory {
        field: "pA2fuBPhwX7",
        code: "B2",
        display: "Factores determinantes para la clasificación muestran tendencias conflictivas a favor y en contra de una asociacion causal con la vacunació",
    },
    CausalityCategory {
        field: "pJk4Slb5EFb",
        code: "C",
        display: "Causa Coincidente",
    },
    CausalityCategory {
        field: "YC286LMPlQW",
        code: "NC",
        display: "No clasificable",
    },
];
