// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

// Env values used by the OSS client.
pub const ALIBABA_CLOUD_ACCESS_KEY_ID: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ALIBABA_CLOUD_ACCESS_KEY_SECRET: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const ALIBABA_CLOUD_OSS_REGION: &str = "ALIBABA_CLOUD_OSS_REGION";
pub const ALIBABA_CLOUD_OSS_INTERNAL: &str = "ALIBABA_CLOUD_OSS_INTERNAL";

// Headers used by OSS.
pub const CONTENT_MD5: &str = "content-md5";
pub const X_OSS_PREFIX: &str = "x-oss-";
pub const X_OSS_META_PREFIX: &str = "x-oss-meta-";
pub const X_OSS_ACL: &str = "x-oss-acl";
pub const X_OSS_COPY_SOURCE: &str = "x-oss-copy-source";
pub const X_OSS_COPY_SOURCE_RANGE: &str = "x-oss-copy-source-range";
pub const X_OSS_METADATA_DIRECTIVE: &str = "x-oss-metadata-directive";
pub const X_OSS_SERVER_SIDE_ENCRYPTION: &str = "x-oss-server-side-encryption";

// Query parameters used by signed urls.
pub const OSS_ACCESS_KEY_ID: &str = "OSSAccessKeyId";
pub const EXPIRES: &str = "Expires";
pub const SIGNATURE: &str = "Signature";

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
pub const WEBSITE_XMLNS: &str = "http://doc.oss-cn-hangzhou.aliyuncs.com";
