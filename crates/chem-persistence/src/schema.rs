// Esquema Diesel del subconjunto de ChEMBL usado por el catálogo.
// Tablas: molecule_dictionary, compound_properties, compound_structures
use diesel::allow_tables_to_appear_in_same_query;
diesel::table! {
    molecule_dictionary (molregno) {
        molregno -> BigInt,
        pref_name -> Nullable<Text>,
        chembl_id -> Text,
        max_phase -> Nullable<Double>,
        molecule_type -> Nullable<Text>,
    }
}
diesel::table! {
    compound_properties (molregno) {
        molregno -> BigInt,
        full_mwt -> Nullable<Double>,
        alogp -> Nullable<Double>,
        hbd -> Nullable<Integer>,
        hba -> Nullable<Integer>,
    }
}
diesel::table! {
    compound_structures (molregno) {
        molregno -> BigInt,
        canonical_smiles -> Nullable<Text>,
    }
}
diesel::joinable!(compound_properties -> molecule_dictionary (molregno));
diesel::joinable!(compound_structures -> molecule_dictionary (molregno));
allow_tables_to_appear_in_same_query!(molecule_dictionary, compound_properties, compound_structures);
