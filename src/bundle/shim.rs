//! Fixed capability shim prepended to every logic bundle.
//!
//! The host document may be opened as a plain image, embedded in another
//! page, or installed as an app; the shim gives bundled code safe fallbacks
//! for environment features that may be missing in those contexts.

/// Marker string the validator looks for to confirm the composite document
/// declares its offline/storage capabilities. Lives inside a string literal
/// so minification cannot strip or reshape it.
pub const OFFLINE_MARKER: &str = "svgpack:offline";

/// Capability shim source. Prepended verbatim to the logic bundle after
/// optional minification of user code, so the shim text is stable no
/// matter which flags a build runs with.
pub const CAPABILITY_SHIM: &str = r#"var svgpack = (function () {
  "use strict";
  var doc = typeof document !== "undefined" ? document : null;
  function root() {
    return doc ? doc.documentElement : null;
  }
  function byId(id) {
    return doc ? doc.getElementById(id) : null;
  }
  function setAttr(el, name, value) {
    if (el && el.setAttribute) {
      el.setAttribute(name, value);
    }
    return el;
  }
  var storage = null;
  try {
    storage = typeof localStorage !== "undefined" ? localStorage : null;
  } catch (e) {
    storage = null;
  }
  function asset(name) {
    var table = byId("svgpack-assets");
    if (!table) {
      return null;
    }
    var map = JSON.parse(table.textContent || "{}");
    return map[name] || null;
  }
  return {
    root: root,
    byId: byId,
    setAttr: setAttr,
    storage: storage,
    asset: asset,
    capabilities: ["svgpack:offline", "svgpack:storage"]
  };
})();
"#;
