//! The fixed clinical-field taxonomy
//!
//! Every value the engine produces is keyed by one of these fields. The
//! set is closed: downstream export columns, the rule battery, and the
//! LLM response schema are all derived from it.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How a field's final value is rendered by the arbitrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Renders to exactly "Yes" or "No", never blank
    YesNo,
    /// Free-form string or numeric-as-string value
    Scalar,
    /// Deduplicated, order-independent comma-joined list
    List,
}

/// One entry of the fixed clinical-field taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum Field {
    PregnancyTrimester,
    BirthweightProvided,
    GaAtDeliveryProvided,
    GaAtDeliveryWeeks,
    GaAtCollectionProvided,
    GaAtCollectionWeeks,
    SexOfOffspringProvided,
    ParityProvided,
    GravidityProvided,
    NumOffspringProvided,
    RaceEthnicityProvided,
    GeneticAncestryProvided,
    MaternalHeightProvided,
    MaternalPrepregWeightProvided,
    PaternalHeightProvided,
    PaternalWeightProvided,
    MaternalAgeProvided,
    PaternalAgeProvided,
    ComplicationSamplesCollected,
    ModeOfDeliveryProvided,
    PregnancyComplicationsList,
    FetalComplicationsListed,
    FetalComplications,
    HospitalCenter,
    CountryOfCollection,
}

impl Field {
    /// Every field, in taxonomy order
    pub const ALL: [Field; 25] = [
        Field::PregnancyTrimester,
        Field::BirthweightProvided,
        Field::GaAtDeliveryProvided,
        Field::GaAtDeliveryWeeks,
        Field::GaAtCollectionProvided,
        Field::GaAtCollectionWeeks,
        Field::SexOfOffspringProvided,
        Field::ParityProvided,
        Field::GravidityProvided,
        Field::NumOffspringProvided,
        Field::RaceEthnicityProvided,
        Field::GeneticAncestryProvided,
        Field::MaternalHeightProvided,
        Field::MaternalPrepregWeightProvided,
        Field::PaternalHeightProvided,
        Field::PaternalWeightProvided,
        Field::MaternalAgeProvided,
        Field::PaternalAgeProvided,
        Field::ComplicationSamplesCollected,
        Field::ModeOfDeliveryProvided,
        Field::PregnancyComplicationsList,
        Field::FetalComplicationsListed,
        Field::FetalComplications,
        Field::HospitalCenter,
        Field::CountryOfCollection,
    ];

    /// Stable machine key. Used in audit artifacts and as the property
    /// name in the LLM response schema.
    pub fn key(&self) -> &'static str {
        match self {
            Field::PregnancyTrimester => "pregnancy_trimester",
            Field::BirthweightProvided => "birthweight_provided",
            Field::GaAtDeliveryProvided => "ga_at_delivery_provided",
            Field::GaAtDeliveryWeeks => "ga_at_delivery_weeks",
            Field::GaAtCollectionProvided => "ga_at_collection_provided",
            Field::GaAtCollectionWeeks => "ga_at_collection_weeks",
            Field::SexOfOffspringProvided => "sex_of_offspring_provided",
            Field::ParityProvided => "parity_provided",
            Field::GravidityProvided => "gravidity_provided",
            Field::NumOffspringProvided => "num_offspring_per_pregnancy_provided",
            Field::RaceEthnicityProvided => "race_ethnicity_provided",
            Field::GeneticAncestryProvided => "genetic_ancestry_or_strain_provided",
            Field::MaternalHeightProvided => "maternal_height_provided",
            Field::MaternalPrepregWeightProvided => "maternal_prepreg_weight_provided",
            Field::PaternalHeightProvided => "paternal_height_provided",
            Field::PaternalWeightProvided => "paternal_weight_provided",
            Field::MaternalAgeProvided => "maternal_age_at_collection_provided",
            Field::PaternalAgeProvided => "paternal_age_at_collection_provided",
            Field::ComplicationSamplesCollected => {
                "samples_from_pregnancy_complications_collected"
            }
            Field::ModeOfDeliveryProvided => "mode_of_delivery_provided",
            Field::PregnancyComplicationsList => "pregnancy_complications_list",
            Field::FetalComplicationsListed => "fetal_complications_listed",
            Field::FetalComplications => "fetal_complications",
            Field::HospitalCenter => "hospital_center",
            Field::CountryOfCollection => "country_of_collection",
        }
    }

    /// Look up a field by its machine key
    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// Human-readable export column label for this field
    pub fn label(&self) -> &'static str {
        match self {
            Field::PregnancyTrimester => {
                "Pregnancy trimester (1st, 2nd, 3rd, term (for full-term delivery), \
                 premature (for early delivery due to complications)"
            }
            Field::BirthweightProvided => "Birthweight of offspring provided (yes/no)",
            Field::GaAtDeliveryProvided => "Gestational Age at delivery provided (yes/no)",
            Field::GaAtDeliveryWeeks => "GA at delivery (weeks)",
            Field::GaAtCollectionProvided => {
                "Gestational Age at sample collection provided (yes/no)"
            }
            Field::GaAtCollectionWeeks => "GA at sample collection (weeks)",
            Field::SexOfOffspringProvided => "Sex of Offspring Provided (yes/no)",
            Field::ParityProvided => "Parity provided (yes/no)",
            Field::GravidityProvided => "Gravidity provided (yes/no)",
            Field::NumOffspringProvided => {
                "Number of offspring per pregnancy provided (yes/no)"
            }
            Field::RaceEthnicityProvided => {
                "Self-reported race/ethnicity of mother provided (yes/no)"
            }
            Field::GeneticAncestryProvided => {
                "Genetic ancestry or genetic strain provided (yes/no)"
            }
            Field::MaternalHeightProvided => "Maternal Height provided (yes/no)",
            Field::MaternalPrepregWeightProvided => {
                "Maternal Pre-pregnancy Weight provided (yes/no)"
            }
            Field::PaternalHeightProvided => "Paternal Height provided (yes/no)",
            Field::PaternalWeightProvided => "Paternal Weight provided (yes/no)",
            Field::MaternalAgeProvided => {
                "Maternal age at sample collection provided (yes/no)"
            }
            Field::PaternalAgeProvided => {
                "Paternal age at sample collection provided (yes/no)"
            }
            Field::ComplicationSamplesCollected => {
                "Samples from pregnancy complications collected"
            }
            Field::ModeOfDeliveryProvided => "Mode of delivery provided (yes/no)",
            Field::PregnancyComplicationsList => {
                "Pregnancy complications in data set (list)"
            }
            Field::FetalComplicationsListed => "Fetal complications listed (yes/no)",
            Field::FetalComplications => "Fetal complications in data set (list)",
            Field::HospitalCenter => "Hospital/Center where samples were collected",
            Field::CountryOfCollection => "Country where samples were collected",
        }
    }

    /// Rendering discipline for the field's final value
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::PregnancyComplicationsList | Field::FetalComplications => FieldKind::List,
            Field::PregnancyTrimester
            | Field::GaAtDeliveryWeeks
            | Field::GaAtCollectionWeeks
            | Field::HospitalCenter
            | Field::CountryOfCollection => FieldKind::Scalar,
            _ => FieldKind::YesNo,
        }
    }

    /// Fields whose absence after arbitration raises a diagnostic problem
    pub fn is_critical(&self) -> bool {
        matches!(self, Field::PregnancyTrimester | Field::HospitalCenter)
    }

    /// Whether the LLM filler may propose a value for this field.
    /// The fetal complication list is rule-aggregate only.
    pub fn llm_fillable(&self) -> bool {
        !matches!(self, Field::FetalComplications)
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Field::from_key(&key)
            .ok_or_else(|| D::Error::custom(format!("unknown field key '{}'", key)))
    }
}
