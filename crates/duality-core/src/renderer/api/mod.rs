// Copyright 2025 eraflo
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

//! Backend-agnostic data types shared by the scene and the render pipeline.

pub mod flags;
pub mod handles;
pub mod light;
pub mod operation;
pub mod pass;
pub mod quad;
pub mod resource;

pub use self::flags::*;
pub use self::handles::*;
pub use self::light::*;
pub use self::operation::*;
pub use self::pass::*;
pub use self::quad::*;
pub use self::resource::*;
