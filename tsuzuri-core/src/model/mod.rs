//! Typed FHIR R4 model for the resources a clinical document carries.

pub mod datatypes;
pub mod document;
pub mod resource;

pub use datatypes::{
    Address, Annotation, CodeableConcept, Coding, ContactPoint, Extension, HumanName, Identifier,
    NameRepresentation, Narrative, Period, Quantity, Reference, ReferenceTarget, ResourceType,
    full_url_for,
};
pub use document::{Bundle, BundleEntry};
pub use resource::{
    AllergyIntolerance, AllergyReaction, ClinicalResource, Composition, Condition,
    DispenseRequest, DoseAndRate, Dosage, Encounter, Hospitalization, MedicationRequest, Meta,
    Observation, ObservationValue, Organization, Patient, Practitioner, Procedure,
    ReferenceRange, Section, ServiceRequest,
};
