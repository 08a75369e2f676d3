// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod datasource_test;
pub mod migration_test;
pub mod persistence_unit_test;
