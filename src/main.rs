mod config;

use chem_catalog::{CatalogError, CompoundCatalog, ListingRequest};
use chem_live::{snapshot_channel, AggregateBroadcaster};
use chem_persistence::NewCompound;
use config::CatalogSettings;
use log::{error, info, warn};
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

/// Menú interactivo para consultar el catálogo de compuestos usando el
/// almacén proporcionado por `chem-persistence`.
///
/// Opciones soportadas:
/// 1) Buscar compuestos (filtros, orden y paginación)
/// 2) Ver detalle de un compuesto
/// 3) Seguir el conteo por tipo en vivo
/// 4) Cargar compuestos de ejemplo (SQLite local)
/// 5) Salir
fn main() -> Result<(), Box<dyn Error>> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let settings = CatalogSettings::from_env();
  let store = Arc::new(chem_persistence::new_from_env()?);
  let catalog = CompoundCatalog::new(store.clone()).with_max_page_size(settings.max_page_size);
  let runtime = tokio::runtime::Runtime::new()?;
  info!("catálogo listo (página máxima {}, intervalo {:?})",
        settings.max_page_size,
        settings.broadcast_interval);

  loop {
    println!("\n== Catálogo de compuestos ==");
    println!("1) Buscar compuestos");
    println!("2) Ver detalle por ChEMBL ID");
    println!("3) Conteo por tipo en vivo");
    println!("4) Cargar compuestos de ejemplo");
    println!("5) Salir");
    let choice = prompt("Elige una opción: ")?;
    match choice.trim() {
      "1" => {
        let req = ListingRequest { name: optional(prompt("Nombre o ChEMBL ID (enter para todos): ")?),
                                   min_weight: optional(prompt("Peso mínimo: ")?),
                                   max_weight: optional(prompt("Peso máximo: ")?),
                                   molecule_types: optional(prompt("Tipos (separados por coma): ")?),
                                   sort_by: optional(prompt("Ordenar por (chembl_id|name|molecular_weight|type): ")?),
                                   order: optional(prompt("Orden (ASC|DESC): ")?),
                                   page: optional(prompt("Página: ")?),
                                   limit: optional(prompt("Tamaño de página: ")?) };
        match catalog.list_from_request(&req) {
          Ok(page) => println!("{}", serde_json::to_string_pretty(&page)?),
          Err(e) => error!("Error del servidor: {}", e),
        }
      }
      "2" => {
        let id = prompt("ChEMBL ID: ")?;
        match catalog.get_one(id.trim()) {
          Ok(detail) => println!("{}", serde_json::to_string_pretty(&detail)?),
          Err(CatalogError::NotFound(_)) => eprintln!("Compuesto no encontrado"),
          Err(e) => error!("Error del servidor: {}", e),
        }
      }
      "3" => {
        let ticks: usize = prompt("¿Cuántas actualizaciones? ")?.trim().parse().unwrap_or(3);
        let store = store.clone();
        let interval = settings.broadcast_interval;
        runtime.block_on(async move {
                 let broadcaster = AggregateBroadcaster::new(store, interval);
                 let (tx, mut rx) = snapshot_channel();
                 let subscription = broadcaster.subscribe(tx);
                 for _ in 0..ticks {
                   match rx.recv().await {
                     Some(snapshot) => match serde_json::to_string(&snapshot.to_chart_update()) {
                       Ok(line) => println!("{}", line),
                       Err(e) => error!("Error serializando: {}", e),
                     },
                     None => break,
                   }
                 }
                 subscription.unsubscribe();
               });
      }
      "4" => {
        for c in demo_compounds() {
          match store.insert_compound(&c) {
            Ok(()) => println!("Insertado {}", c.chembl_id),
            Err(e) => warn!("No se pudo insertar {}: {}", c.chembl_id, e),
          }
        }
      }
      "5" => break,
      _ => println!("Opción no válida"),
    }
  }
  Ok(())
}

fn prompt(msg: &str) -> io::Result<String> {
  print!("{}", msg);
  io::stdout().flush().ok();
  let mut s = String::new();
  io::stdin().read_line(&mut s)?;
  Ok(s)
}

fn optional(s: String) -> Option<String> {
  let t = s.trim();
  if t.is_empty() {
    None
  } else {
    Some(t.to_string())
  }
}

fn demo_compounds() -> Vec<NewCompound> {
  let mut aspirin = NewCompound::new(1280, "CHEMBL25", "Small molecule", 180.16).with_name("ASPIRIN")
                                                                              .with_smiles("CC(=O)Oc1ccccc1C(=O)O");
  aspirin.max_phase = Some(4.0);
  aspirin.alogp = Some(1.31);
  aspirin.hbd = Some(1);
  aspirin.hba = Some(3);
  let mut caffeine = NewCompound::new(1716, "CHEMBL113", "Small molecule", 194.19).with_name("CAFFEINE")
                                                                                .with_smiles("Cn1c(=O)c2c(ncn2C)n(C)c1=O");
  caffeine.max_phase = Some(4.0);
  caffeine.alogp = Some(-1.03);
  caffeine.hbd = Some(0);
  caffeine.hba = Some(6);
  let insulin = NewCompound::new(675343, "CHEMBL1201247", "Protein", 5807.57).with_name("INSULIN HUMAN");
  vec![aspirin, caffeine, insulin]
}
