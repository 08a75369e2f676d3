// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use customer_datasource::config::customer::CustomerPersistence;
use customer_datasource::config::settings;
use customer_datasource::domain::repositories::customer_repository::CustomerRepository;
use customer_datasource::utils::telemetry;
use migration::{Migrator, MigratorTrait};
use tracing::info;

/// 主函数
///
/// 装配客户持久化单元，校验后关闭
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting customer-datasource...");

    // 2. Load configuration
    let config = settings::load_configuration()?;
    info!("Configuration loaded");

    // 3. Build pool, persistence unit and transaction manager
    let persistence = CustomerPersistence::initialize(&config).await?;

    // Schema is either generated from the entities or supplied by migrations
    if !persistence.jpa.generate_ddl {
        info!("Running database migrations...");
        Migrator::up(persistence.data_source.connection(), None).await?;
        info!("Database migrations applied");
    }

    let customers = persistence.customer_repository().count().await?;
    info!(
        unit = persistence.entity_manager.unit_name(),
        customers, "Customer persistence unit ready"
    );

    persistence.shutdown().await?;
    Ok(())
}
