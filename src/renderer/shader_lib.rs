// renderer/shader_lib.rs
// Built-in GLSL for every material kind, assembled from shared chunks, and
// the default uniform values each kind starts with. Program parameters
// decide which chunks are live through the prefix defines.

use glam::{Vec2, Vec3, Vec4};

use crate::renderer::material::{MaterialFeatures, MaterialKind, ShaderMaterial};
use crate::renderer::uniforms::{UniformValue, Uniforms};

/// Attribute names looked up in every linked program.
pub const STANDARD_ATTRIBUTES: &[&str] = &[
    "position",
    "normal",
    "uv",
    "uv2",
    "tangent",
    "color",
    "skinIndex",
    "skinWeight",
    "lineDistance",
    "morphTarget0",
    "morphTarget1",
    "morphTarget2",
    "morphTarget3",
    "morphTarget4",
    "morphTarget5",
    "morphTarget6",
    "morphTarget7",
    "morphNormal0",
    "morphNormal1",
    "morphNormal2",
    "morphNormal3",
];

/// Uniform names looked up in every linked program besides the material's
/// own.
pub const STANDARD_UNIFORMS: &[&str] = &[
    "viewMatrix",
    "modelViewMatrix",
    "projectionMatrix",
    "normalMatrix",
    "modelMatrix",
    "cameraPosition",
    "morphTargetInfluences",
    "boneGlobalMatrices",
    "boneTexture",
    "boneTextureWidth",
    "boneTextureHeight",
    "logDepthBufFC",
];

const COMMON: &str = "\
#define PI 3.14159265359
#define saturate(a) clamp( a, 0.0, 1.0 )
float calcLightAttenuation( float lightDistance, float cutoffDistance, float decayExponent ) {
	if ( decayExponent > 0.0 && cutoffDistance > 0.0 ) {
		return pow( saturate( - lightDistance / cutoffDistance + 1.0 ), decayExponent );
	}
	return 1.0;
}
";

const UV_PARS_VERTEX: &str = "\
#ifdef USE_UV
varying vec2 vUv;
uniform vec4 offsetRepeat;
#endif
#ifdef USE_UV2
varying vec2 vUv2;
#endif
";

const UV_VERTEX: &str = "\
#ifdef USE_UV
	vUv = uv * offsetRepeat.zw + offsetRepeat.xy;
#endif
#ifdef USE_UV2
	vUv2 = uv2;
#endif
";

const UV_PARS_FRAGMENT: &str = "\
#ifdef USE_UV
varying vec2 vUv;
#endif
#ifdef USE_UV2
varying vec2 vUv2;
#endif
";

const COLOR_PARS_VERTEX: &str = "\
#ifdef USE_COLOR
varying vec3 vColor;
#endif
";

const COLOR_VERTEX: &str = "\
#ifdef USE_COLOR
#ifdef GAMMA_INPUT
	vColor = color * color;
#else
	vColor = color;
#endif
#endif
";

const COLOR_PARS_FRAGMENT: &str = "\
#ifdef USE_COLOR
varying vec3 vColor;
#endif
";

const COLOR_FRAGMENT: &str = "\
#ifdef USE_COLOR
	diffuseColor.rgb *= vColor;
#endif
";

const MAP_PARS_FRAGMENT: &str = "\
#ifdef USE_MAP
uniform sampler2D map;
#endif
";

const MAP_FRAGMENT: &str = "\
#ifdef USE_MAP
	vec4 texelColor = texture2D( map, vUv );
#ifdef GAMMA_INPUT
	texelColor.xyz *= texelColor.xyz;
#endif
	diffuseColor *= texelColor;
#endif
";

const ALPHAMAP_PARS_FRAGMENT: &str = "\
#ifdef USE_ALPHAMAP
uniform sampler2D alphaMap;
#endif
";

const ALPHAMAP_FRAGMENT: &str = "\
#ifdef USE_ALPHAMAP
	diffuseColor.a *= texture2D( alphaMap, vUv ).g;
#endif
";

const ALPHATEST_FRAGMENT: &str = "\
#ifdef ALPHATEST
	if ( diffuseColor.a < ALPHATEST ) discard;
#endif
";

const SPECULARMAP_PARS_FRAGMENT: &str = "\
#ifdef USE_SPECULARMAP
uniform sampler2D specularMap;
#endif
";

const SPECULARMAP_FRAGMENT: &str = "\
	float specularStrength;
#ifdef USE_SPECULARMAP
	vec4 texelSpecular = texture2D( specularMap, vUv );
	specularStrength = texelSpecular.r;
#else
	specularStrength = 1.0;
#endif
";

const LIGHTMAP_PARS_FRAGMENT: &str = "\
#ifdef USE_LIGHTMAP
uniform sampler2D lightMap;
#endif
";

const LIGHTMAP_FRAGMENT: &str = "\
#ifdef USE_LIGHTMAP
	outgoingLight *= diffuseColor.xyz * texture2D( lightMap, vUv2 ).xyz;
#endif
";

const EMISSIVEMAP_PARS_FRAGMENT: &str = "\
#ifdef USE_EMISSIVEMAP
uniform sampler2D emissiveMap;
#endif
";

const EMISSIVEMAP_FRAGMENT: &str = "\
	vec3 totalEmissiveLight = emissive;
#ifdef USE_EMISSIVEMAP
	vec4 emissiveColor = texture2D( emissiveMap, vUv );
#ifdef GAMMA_INPUT
	emissiveColor.rgb *= emissiveColor.rgb;
#endif
	totalEmissiveLight *= emissiveColor.rgb;
#endif
";

const ENVMAP_PARS_VERTEX: &str = "\
#ifdef USE_ENVMAP
varying vec3 vReflect;
uniform float refractionRatio;
#endif
";

const ENVMAP_VERTEX: &str = "\
#ifdef USE_ENVMAP
	vec3 cameraToVertex = normalize( worldPosition.xyz - cameraPosition );
	vec3 worldNormal = normalize( mat3( modelMatrix[ 0 ].xyz, modelMatrix[ 1 ].xyz, modelMatrix[ 2 ].xyz ) * objectNormal );
	vReflect = reflect( cameraToVertex, worldNormal );
#endif
";

const ENVMAP_PARS_FRAGMENT: &str = "\
#ifdef USE_ENVMAP
uniform float reflectivity;
uniform samplerCube envMap;
uniform float flipEnvMap;
uniform int combine;
varying vec3 vReflect;
#endif
";

const ENVMAP_FRAGMENT: &str = "\
#ifdef USE_ENVMAP
	vec4 envColor = textureCube( envMap, vec3( flipEnvMap * vReflect.x, vReflect.yz ) );
#ifdef GAMMA_INPUT
	envColor.xyz *= envColor.xyz;
#endif
	if ( combine == 1 ) {
		outgoingLight = mix( outgoingLight, envColor.xyz, specularStrength * reflectivity );
	} else if ( combine == 2 ) {
		outgoingLight += envColor.xyz * specularStrength * reflectivity;
	} else {
		outgoingLight = mix( outgoingLight, outgoingLight * envColor.xyz, specularStrength * reflectivity );
	}
#endif
";

const FOG_PARS_FRAGMENT: &str = "\
#ifdef USE_FOG
uniform vec3 fogColor;
#ifdef FOG_EXP2
uniform float fogDensity;
#else
uniform float fogNear;
uniform float fogFar;
#endif
#endif
";

const FOG_FRAGMENT: &str = "\
#ifdef USE_FOG
	float fogDepth = gl_FragCoord.z / gl_FragCoord.w;
#ifdef FOG_EXP2
	float fogFactor = saturate( 1.0 - exp2( - fogDensity * fogDensity * fogDepth * fogDepth * 1.442695 ) );
#else
	float fogFactor = smoothstep( fogNear, fogFar, fogDepth );
#endif
	outgoingLight = mix( outgoingLight, fogColor, fogFactor );
#endif
";

const LINEAR_TO_GAMMA_FRAGMENT: &str = "\
#ifdef GAMMA_OUTPUT
	outgoingLight = pow( outgoingLight, vec3( 1.0 / GAMMA_FACTOR ) );
#endif
";

const LOGDEPTHBUF_PARS_VERTEX: &str = "\
#ifdef USE_LOGDEPTHBUF
uniform float logDepthBufFC;
#endif
";

const LOGDEPTHBUF_VERTEX: &str = "\
#ifdef USE_LOGDEPTHBUF
	gl_Position.z = log2( max( 1e-6, gl_Position.w + 1.0 ) ) * logDepthBufFC;
	gl_Position.z = ( gl_Position.z - 1.0 ) * gl_Position.w;
#endif
";

const MORPHTARGET_PARS_VERTEX: &str = "\
#ifdef USE_MORPHTARGETS
uniform float morphTargetInfluences[ MAX_MORPH_TARGETS ];
#endif
";

const SKINNING_PARS_VERTEX: &str = "\
#ifdef USE_SKINNING
#ifdef BONE_TEXTURE
uniform sampler2D boneTexture;
uniform int boneTextureWidth;
uniform int boneTextureHeight;
mat4 getBoneMatrix( const in float i ) {
	float j = i * 4.0;
	float x = mod( j, float( boneTextureWidth ) );
	float y = floor( j / float( boneTextureWidth ) );
	float dx = 1.0 / float( boneTextureWidth );
	float dy = 1.0 / float( boneTextureHeight );
	y = dy * ( y + 0.5 );
	vec4 v1 = texture2D( boneTexture, vec2( dx * ( x + 0.5 ), y ) );
	vec4 v2 = texture2D( boneTexture, vec2( dx * ( x + 1.5 ), y ) );
	vec4 v3 = texture2D( boneTexture, vec2( dx * ( x + 2.5 ), y ) );
	vec4 v4 = texture2D( boneTexture, vec2( dx * ( x + 3.5 ), y ) );
	return mat4( v1, v2, v3, v4 );
}
#else
uniform mat4 boneGlobalMatrices[ MAX_BONES ];
mat4 getBoneMatrix( const in float i ) {
	return boneGlobalMatrices[ int( i ) ];
}
#endif
#endif
";

const SKINBASE_VERTEX: &str = "\
#ifdef USE_SKINNING
	mat4 boneMatX = getBoneMatrix( skinIndex.x );
	mat4 boneMatY = getBoneMatrix( skinIndex.y );
	mat4 boneMatZ = getBoneMatrix( skinIndex.z );
	mat4 boneMatW = getBoneMatrix( skinIndex.w );
#endif
";

const SKINNORMAL_VERTEX: &str = "\
#ifdef USE_SKINNING
	mat4 skinMatrix = mat4( 0.0 );
	skinMatrix += skinWeight.x * boneMatX;
	skinMatrix += skinWeight.y * boneMatY;
	skinMatrix += skinWeight.z * boneMatZ;
	skinMatrix += skinWeight.w * boneMatW;
	objectNormal = vec4( skinMatrix * vec4( objectNormal, 0.0 ) ).xyz;
#endif
";

const SKINNING_VERTEX: &str = "\
#ifdef USE_SKINNING
	vec4 skinVertex = vec4( transformed, 1.0 );
	vec4 skinned = vec4( 0.0 );
	skinned += boneMatX * skinVertex * skinWeight.x;
	skinned += boneMatY * skinVertex * skinWeight.y;
	skinned += boneMatZ * skinVertex * skinWeight.z;
	skinned += boneMatW * skinVertex * skinWeight.w;
	transformed = skinned.xyz;
#endif
";

const SHADOWMAP_PARS_VERTEX: &str = "\
#ifdef USE_SHADOWMAP
varying vec4 vShadowCoord[ MAX_SHADOWS ];
uniform mat4 shadowMatrix[ MAX_SHADOWS ];
#endif
";

const SHADOWMAP_VERTEX: &str = "\
#ifdef USE_SHADOWMAP
	for ( int i = 0; i < MAX_SHADOWS; i ++ ) {
		vShadowCoord[ i ] = shadowMatrix[ i ] * worldPosition;
	}
#endif
";

const SHADOWMAP_PARS_FRAGMENT: &str = "\
#ifdef USE_SHADOWMAP
uniform sampler2D shadowMap[ MAX_SHADOWS ];
uniform vec2 shadowMapSize[ MAX_SHADOWS ];
uniform float shadowDarkness[ MAX_SHADOWS ];
uniform float shadowBias[ MAX_SHADOWS ];
varying vec4 vShadowCoord[ MAX_SHADOWS ];
float unpackDepth( const in vec4 rgba_depth ) {
	const vec4 bit_shift = vec4( 1.0 / ( 256.0 * 256.0 * 256.0 ), 1.0 / ( 256.0 * 256.0 ), 1.0 / 256.0, 1.0 );
	return dot( rgba_depth, bit_shift );
}
#endif
";

const SHADOWMAP_FRAGMENT: &str = "\
#ifdef USE_SHADOWMAP
	vec3 shadowColor = vec3( 1.0 );
	for ( int i = 0; i < MAX_SHADOWS; i ++ ) {
		vec3 shadowCoord = vShadowCoord[ i ].xyz / vShadowCoord[ i ].w;
		bool inFrustum = shadowCoord.x >= 0.0 && shadowCoord.x <= 1.0 && shadowCoord.y >= 0.0 && shadowCoord.y <= 1.0 && shadowCoord.z <= 1.0;
		if ( inFrustum ) {
			shadowCoord.z += shadowBias[ i ];
#ifdef SHADOWMAP_TYPE_BASIC
			float fDepth = unpackDepth( texture2D( shadowMap[ i ], shadowCoord.xy ) );
			if ( fDepth < shadowCoord.z ) {
				shadowColor = shadowColor * vec3( 1.0 - shadowDarkness[ i ] );
			}
#else
			float shadow = 0.0;
			vec2 texelSize = 1.0 / shadowMapSize[ i ];
			for ( float y = -1.0; y <= 1.0; y += 1.0 ) {
				for ( float x = -1.0; x <= 1.0; x += 1.0 ) {
					float fDepth = unpackDepth( texture2D( shadowMap[ i ], shadowCoord.xy + vec2( x, y ) * texelSize ) );
					if ( fDepth < shadowCoord.z ) shadow += 1.0;
				}
			}
			shadow /= 9.0;
			shadowColor = shadowColor * vec3( 1.0 - shadowDarkness[ i ] * shadow );
#endif
		}
	}
	outgoingLight = outgoingLight * shadowColor;
#endif
";

const LIGHTS_PARS: &str = "\
uniform vec3 ambientLightColor;
#if MAX_DIR_LIGHTS > 0
uniform vec3 directionalLightColor[ MAX_DIR_LIGHTS ];
uniform vec3 directionalLightDirection[ MAX_DIR_LIGHTS ];
#endif
#if MAX_HEMI_LIGHTS > 0
uniform vec3 hemisphereLightSkyColor[ MAX_HEMI_LIGHTS ];
uniform vec3 hemisphereLightGroundColor[ MAX_HEMI_LIGHTS ];
uniform vec3 hemisphereLightDirection[ MAX_HEMI_LIGHTS ];
#endif
#if MAX_POINT_LIGHTS > 0
uniform vec3 pointLightColor[ MAX_POINT_LIGHTS ];
uniform vec3 pointLightPosition[ MAX_POINT_LIGHTS ];
uniform float pointLightDistance[ MAX_POINT_LIGHTS ];
uniform float pointLightDecay[ MAX_POINT_LIGHTS ];
#endif
#if MAX_SPOT_LIGHTS > 0
uniform vec3 spotLightColor[ MAX_SPOT_LIGHTS ];
uniform vec3 spotLightPosition[ MAX_SPOT_LIGHTS ];
uniform vec3 spotLightDirection[ MAX_SPOT_LIGHTS ];
uniform float spotLightDistance[ MAX_SPOT_LIGHTS ];
uniform float spotLightAngleCos[ MAX_SPOT_LIGHTS ];
uniform float spotLightExponent[ MAX_SPOT_LIGHTS ];
uniform float spotLightDecay[ MAX_SPOT_LIGHTS ];
#endif
";

const LIGHTS_LAMBERT_VERTEX: &str = "\
	vLightFront = vec3( 0.0 );
#ifdef DOUBLE_SIDED
	vLightBack = vec3( 0.0 );
#endif
	vec3 normalView = normalize( transformedNormal );
#if MAX_DIR_LIGHTS > 0
	for ( int i = 0; i < MAX_DIR_LIGHTS; i ++ ) {
		vec3 dirVector = normalize( ( viewMatrix * vec4( directionalLightDirection[ i ], 0.0 ) ).xyz );
		float dotProduct = dot( normalView, dirVector );
		vLightFront += directionalLightColor[ i ] * max( dotProduct, 0.0 );
#ifdef DOUBLE_SIDED
		vLightBack += directionalLightColor[ i ] * max( - dotProduct, 0.0 );
#endif
	}
#endif
#if MAX_POINT_LIGHTS > 0
	for ( int i = 0; i < MAX_POINT_LIGHTS; i ++ ) {
		vec4 lPosition = viewMatrix * vec4( pointLightPosition[ i ], 1.0 );
		vec3 lVector = lPosition.xyz - mvPosition.xyz;
		float attenuation = calcLightAttenuation( length( lVector ), pointLightDistance[ i ], pointLightDecay[ i ] );
		float dotProduct = dot( normalView, normalize( lVector ) );
		vLightFront += pointLightColor[ i ] * max( dotProduct, 0.0 ) * attenuation;
#ifdef DOUBLE_SIDED
		vLightBack += pointLightColor[ i ] * max( - dotProduct, 0.0 ) * attenuation;
#endif
	}
#endif
#if MAX_SPOT_LIGHTS > 0
	for ( int i = 0; i < MAX_SPOT_LIGHTS; i ++ ) {
		vec4 lPosition = viewMatrix * vec4( spotLightPosition[ i ], 1.0 );
		vec3 lVector = lPosition.xyz - mvPosition.xyz;
		float spotEffect = dot( spotLightDirection[ i ], normalize( spotLightPosition[ i ] - worldPosition.xyz ) );
		if ( spotEffect > spotLightAngleCos[ i ] ) {
			spotEffect = max( pow( max( spotEffect, 0.0 ), spotLightExponent[ i ] ), 0.0 );
			float attenuation = calcLightAttenuation( length( lVector ), spotLightDistance[ i ], spotLightDecay[ i ] );
			float dotProduct = dot( normalView, normalize( lVector ) );
			vLightFront += spotLightColor[ i ] * max( dotProduct, 0.0 ) * attenuation * spotEffect;
#ifdef DOUBLE_SIDED
			vLightBack += spotLightColor[ i ] * max( - dotProduct, 0.0 ) * attenuation * spotEffect;
#endif
		}
	}
#endif
#if MAX_HEMI_LIGHTS > 0
	for ( int i = 0; i < MAX_HEMI_LIGHTS; i ++ ) {
		vec3 lVector = normalize( ( viewMatrix * vec4( hemisphereLightDirection[ i ], 0.0 ) ).xyz );
		float hemiDiffuseWeight = 0.5 * dot( normalView, lVector ) + 0.5;
		vLightFront += mix( hemisphereLightGroundColor[ i ], hemisphereLightSkyColor[ i ], hemiDiffuseWeight );
#ifdef DOUBLE_SIDED
		vLightBack += mix( hemisphereLightGroundColor[ i ], hemisphereLightSkyColor[ i ], 1.0 - hemiDiffuseWeight );
#endif
	}
#endif
	vLightFront += ambientLightColor;
#ifdef DOUBLE_SIDED
	vLightBack += ambientLightColor;
#endif
";

const BUMPMAP_PARS_FRAGMENT: &str = "\
#ifdef USE_BUMPMAP
uniform sampler2D bumpMap;
uniform float bumpScale;
vec2 dHdxy_fwd() {
	vec2 dSTdx = dFdx( vUv );
	vec2 dSTdy = dFdy( vUv );
	float Hll = bumpScale * texture2D( bumpMap, vUv ).x;
	float dBx = bumpScale * texture2D( bumpMap, vUv + dSTdx ).x - Hll;
	float dBy = bumpScale * texture2D( bumpMap, vUv + dSTdy ).x - Hll;
	return vec2( dBx, dBy );
}
vec3 perturbNormalArb( vec3 surf_pos, vec3 surf_norm, vec2 dHdxy ) {
	vec3 vSigmaX = dFdx( surf_pos );
	vec3 vSigmaY = dFdy( surf_pos );
	vec3 vN = surf_norm;
	vec3 R1 = cross( vSigmaY, vN );
	vec3 R2 = cross( vN, vSigmaX );
	float fDet = dot( vSigmaX, R1 );
	vec3 vGrad = sign( fDet ) * ( dHdxy.x * R1 + dHdxy.y * R2 );
	return normalize( abs( fDet ) * surf_norm - vGrad );
}
#endif
";

const NORMALMAP_PARS_FRAGMENT: &str = "\
#ifdef USE_NORMALMAP
uniform sampler2D normalMap;
uniform vec2 normalScale;
vec3 perturbNormal2Arb( vec3 eye_pos, vec3 surf_norm ) {
	vec3 q0 = dFdx( eye_pos.xyz );
	vec3 q1 = dFdy( eye_pos.xyz );
	vec2 st0 = dFdx( vUv.st );
	vec2 st1 = dFdy( vUv.st );
	vec3 S = normalize( q0 * st1.t - q1 * st0.t );
	vec3 T = normalize( -q0 * st1.s + q1 * st0.s );
	vec3 N = normalize( surf_norm );
	vec3 mapN = texture2D( normalMap, vUv ).xyz * 2.0 - 1.0;
	mapN.xy = normalScale * mapN.xy;
	mat3 tsn = mat3( S, T, N );
	return normalize( tsn * mapN );
}
#endif
";

const LIGHTS_PHONG_FRAGMENT: &str = "\
#ifndef FLAT_SHADED
	vec3 normal = normalize( vNormal );
#ifdef DOUBLE_SIDED
	normal = normal * ( -1.0 + 2.0 * float( gl_FrontFacing ) );
#endif
#else
	vec3 fdx = dFdx( vViewPosition );
	vec3 fdy = dFdy( vViewPosition );
	vec3 normal = normalize( cross( fdx, fdy ) );
#endif
#ifdef USE_NORMALMAP
	normal = perturbNormal2Arb( -vViewPosition, normal );
#endif
#ifdef USE_BUMPMAP
	normal = perturbNormalArb( -vViewPosition, normal, dHdxy_fwd() );
#endif
	vec3 viewPosition = normalize( vViewPosition );
	vec3 totalDiffuseLight = vec3( 0.0 );
	vec3 totalSpecularLight = vec3( 0.0 );
	float specularNormalization = ( shininess + 2.0 ) / 8.0;
#if MAX_POINT_LIGHTS > 0
	for ( int i = 0; i < MAX_POINT_LIGHTS; i ++ ) {
		vec4 lPosition = viewMatrix * vec4( pointLightPosition[ i ], 1.0 );
		vec3 lVector = lPosition.xyz + vViewPosition.xyz;
		float attenuation = calcLightAttenuation( length( lVector ), pointLightDistance[ i ], pointLightDecay[ i ] );
		lVector = normalize( lVector );
		float diffuseWeight = max( dot( normal, lVector ), 0.0 );
		totalDiffuseLight += pointLightColor[ i ] * diffuseWeight * attenuation;
		vec3 halfVector = normalize( lVector + viewPosition );
		float specularWeight = specularStrength * max( pow( max( dot( normal, halfVector ), 0.0 ), shininess ), 0.0 );
		vec3 schlick = specular + vec3( 1.0 - specular ) * pow( max( 1.0 - dot( lVector, halfVector ), 0.0 ), 5.0 );
		totalSpecularLight += schlick * pointLightColor[ i ] * specularWeight * diffuseWeight * attenuation * specularNormalization;
	}
#endif
#if MAX_SPOT_LIGHTS > 0
	for ( int i = 0; i < MAX_SPOT_LIGHTS; i ++ ) {
		vec4 lPosition = viewMatrix * vec4( spotLightPosition[ i ], 1.0 );
		vec3 lVector = lPosition.xyz + vViewPosition.xyz;
		float attenuation = calcLightAttenuation( length( lVector ), spotLightDistance[ i ], spotLightDecay[ i ] );
		lVector = normalize( lVector );
		float spotEffect = dot( spotLightDirection[ i ], normalize( spotLightPosition[ i ] - vWorldPosition ) );
		if ( spotEffect > spotLightAngleCos[ i ] ) {
			spotEffect = max( pow( max( spotEffect, 0.0 ), spotLightExponent[ i ] ), 0.0 );
			float diffuseWeight = max( dot( normal, lVector ), 0.0 );
			totalDiffuseLight += spotLightColor[ i ] * diffuseWeight * attenuation * spotEffect;
			vec3 halfVector = normalize( lVector + viewPosition );
			float specularWeight = specularStrength * max( pow( max( dot( normal, halfVector ), 0.0 ), shininess ), 0.0 );
			vec3 schlick = specular + vec3( 1.0 - specular ) * pow( max( 1.0 - dot( lVector, halfVector ), 0.0 ), 5.0 );
			totalSpecularLight += schlick * spotLightColor[ i ] * specularWeight * diffuseWeight * attenuation * specularNormalization * spotEffect;
		}
	}
#endif
#if MAX_DIR_LIGHTS > 0
	for ( int i = 0; i < MAX_DIR_LIGHTS; i ++ ) {
		vec3 dirVector = normalize( ( viewMatrix * vec4( directionalLightDirection[ i ], 0.0 ) ).xyz );
		float diffuseWeight = max( dot( normal, dirVector ), 0.0 );
		totalDiffuseLight += directionalLightColor[ i ] * diffuseWeight;
		vec3 halfVector = normalize( dirVector + viewPosition );
		float specularWeight = specularStrength * max( pow( max( dot( normal, halfVector ), 0.0 ), shininess ), 0.0 );
		vec3 schlick = specular + vec3( 1.0 - specular ) * pow( max( 1.0 - dot( dirVector, halfVector ), 0.0 ), 5.0 );
		totalSpecularLight += schlick * directionalLightColor[ i ] * specularWeight * diffuseWeight * specularNormalization;
	}
#endif
#if MAX_HEMI_LIGHTS > 0
	for ( int i = 0; i < MAX_HEMI_LIGHTS; i ++ ) {
		vec3 lVector = normalize( ( viewMatrix * vec4( hemisphereLightDirection[ i ], 0.0 ) ).xyz );
		float hemiDiffuseWeight = 0.5 * dot( normal, lVector ) + 0.5;
		totalDiffuseLight += mix( hemisphereLightGroundColor[ i ], hemisphereLightSkyColor[ i ], hemiDiffuseWeight );
	}
#endif
	outgoingLight += diffuseColor.rgb * ( totalDiffuseLight + ambientLightColor ) + totalSpecularLight + totalEmissiveLight;
";

/// Vertex main shared by the mesh kinds. `extra` runs after every
/// standard varying is written.
fn mesh_vertex(pars: &str, extra: &str) -> String {
    let mut out = String::with_capacity(4096);
    for chunk in [
        COMMON,
        UV_PARS_VERTEX,
        ENVMAP_PARS_VERTEX,
        COLOR_PARS_VERTEX,
        MORPHTARGET_PARS_VERTEX,
        SKINNING_PARS_VERTEX,
        SHADOWMAP_PARS_VERTEX,
        LOGDEPTHBUF_PARS_VERTEX,
        pars,
    ] {
        out.push_str(chunk);
    }
    out.push_str("void main() {\n");
    out.push_str(UV_VERTEX);
    out.push_str(COLOR_VERTEX);
    out.push_str("\tvec3 objectNormal = vec3( normal );\n");
    out.push_str(&morph_normal_vertex());
    out.push_str(SKINBASE_VERTEX);
    out.push_str(SKINNORMAL_VERTEX);
    out.push_str(
        "\tvec3 transformedNormal = normalMatrix * objectNormal;\n\
         #ifdef FLIP_SIDED\n\
         \ttransformedNormal = - transformedNormal;\n\
         #endif\n\
         \tvec3 transformed = vec3( position );\n",
    );
    out.push_str(&morph_target_vertex());
    out.push_str(SKINNING_VERTEX);
    out.push_str(
        "\tvec4 mvPosition = modelViewMatrix * vec4( transformed, 1.0 );\n\
         \tgl_Position = projectionMatrix * mvPosition;\n",
    );
    out.push_str(LOGDEPTHBUF_VERTEX);
    out.push_str("\tvec4 worldPosition = modelMatrix * vec4( transformed, 1.0 );\n");
    out.push_str(ENVMAP_VERTEX);
    out.push_str(extra);
    out.push_str(SHADOWMAP_VERTEX);
    out.push_str("}\n");
    out
}

/// Morph target blend written out per attribute, since GLSL ES cannot
/// index attributes.
fn morph_target_vertex() -> String {
    let mut out = String::from("#ifdef USE_MORPHTARGETS\n");
    for i in 0..8 {
        out.push_str(&format!(
            "#if MAX_MORPH_TARGETS > {i}\n\
             \ttransformed += ( morphTarget{i} - position ) * morphTargetInfluences[ {i} ];\n\
             #endif\n"
        ));
    }
    out.push_str("#endif\n");
    out
}

fn morph_normal_vertex() -> String {
    let mut out = String::from("#ifdef USE_MORPHNORMALS\n");
    for i in 0..4 {
        out.push_str(&format!(
            "#if MAX_MORPH_NORMALS > {i}\n\
             \tobjectNormal += ( morphNormal{i} - normal ) * morphTargetInfluences[ {i} ];\n\
             #endif\n"
        ));
    }
    out.push_str("#endif\n");
    out
}

fn join(chunks: &[&str]) -> String {
    chunks.concat()
}

fn basic() -> (String, String) {
    let vertex = mesh_vertex("", "");
    let fragment = join(&[
        COMMON,
        "uniform vec3 diffuse;\nuniform float opacity;\n",
        COLOR_PARS_FRAGMENT,
        UV_PARS_FRAGMENT,
        MAP_PARS_FRAGMENT,
        ALPHAMAP_PARS_FRAGMENT,
        LIGHTMAP_PARS_FRAGMENT,
        ENVMAP_PARS_FRAGMENT,
        FOG_PARS_FRAGMENT,
        SHADOWMAP_PARS_FRAGMENT,
        SPECULARMAP_PARS_FRAGMENT,
        "void main() {\n\
         \tvec3 outgoingLight = vec3( 0.0 );\n\
         \tvec4 diffuseColor = vec4( diffuse, opacity );\n",
        MAP_FRAGMENT,
        COLOR_FRAGMENT,
        ALPHAMAP_FRAGMENT,
        ALPHATEST_FRAGMENT,
        SPECULARMAP_FRAGMENT,
        "\toutgoingLight = diffuseColor.rgb;\n",
        LIGHTMAP_FRAGMENT,
        ENVMAP_FRAGMENT,
        SHADOWMAP_FRAGMENT,
        LINEAR_TO_GAMMA_FRAGMENT,
        FOG_FRAGMENT,
        "\tgl_FragColor = vec4( outgoingLight, diffuseColor.a );\n}\n",
    ]);
    (vertex, fragment)
}

fn lambert() -> (String, String) {
    let vertex = mesh_vertex(
        &join(&[
            "varying vec3 vLightFront;\n#ifdef DOUBLE_SIDED\nvarying vec3 vLightBack;\n#endif\n",
            LIGHTS_PARS,
        ]),
        LIGHTS_LAMBERT_VERTEX,
    );
    let fragment = join(&[
        COMMON,
        "uniform vec3 diffuse;\nuniform vec3 emissive;\nuniform float opacity;\n\
         varying vec3 vLightFront;\n#ifdef DOUBLE_SIDED\nvarying vec3 vLightBack;\n#endif\n",
        COLOR_PARS_FRAGMENT,
        UV_PARS_FRAGMENT,
        MAP_PARS_FRAGMENT,
        ALPHAMAP_PARS_FRAGMENT,
        LIGHTMAP_PARS_FRAGMENT,
        EMISSIVEMAP_PARS_FRAGMENT,
        ENVMAP_PARS_FRAGMENT,
        FOG_PARS_FRAGMENT,
        SHADOWMAP_PARS_FRAGMENT,
        SPECULARMAP_PARS_FRAGMENT,
        "void main() {\n\
         \tvec3 outgoingLight = vec3( 0.0 );\n\
         \tvec4 diffuseColor = vec4( diffuse, opacity );\n",
        MAP_FRAGMENT,
        COLOR_FRAGMENT,
        ALPHAMAP_FRAGMENT,
        ALPHATEST_FRAGMENT,
        SPECULARMAP_FRAGMENT,
        EMISSIVEMAP_FRAGMENT,
        "#ifdef DOUBLE_SIDED\n\
         \tif ( gl_FrontFacing ) {\n\
         \t\toutgoingLight += diffuseColor.rgb * vLightFront + totalEmissiveLight;\n\
         \t} else {\n\
         \t\toutgoingLight += diffuseColor.rgb * vLightBack + totalEmissiveLight;\n\
         \t}\n\
         #else\n\
         \toutgoingLight += diffuseColor.rgb * vLightFront + totalEmissiveLight;\n\
         #endif\n",
        LIGHTMAP_FRAGMENT,
        ENVMAP_FRAGMENT,
        SHADOWMAP_FRAGMENT,
        LINEAR_TO_GAMMA_FRAGMENT,
        FOG_FRAGMENT,
        "\tgl_FragColor = vec4( outgoingLight, diffuseColor.a );\n}\n",
    ]);
    (vertex, fragment)
}

fn phong() -> (String, String) {
    let vertex = mesh_vertex(
        "varying vec3 vViewPosition;\nvarying vec3 vWorldPosition;\n\
         #ifndef FLAT_SHADED\nvarying vec3 vNormal;\n#endif\n",
        "\tvViewPosition = - mvPosition.xyz;\n\
         \tvWorldPosition = worldPosition.xyz;\n\
         #ifndef FLAT_SHADED\n\
         \tvNormal = normalize( transformedNormal );\n\
         #endif\n",
    );
    let fragment = join(&[
        COMMON,
        "uniform vec3 diffuse;\nuniform vec3 emissive;\nuniform vec3 specular;\n\
         uniform float shininess;\nuniform float opacity;\n\
         varying vec3 vViewPosition;\nvarying vec3 vWorldPosition;\n\
         #ifndef FLAT_SHADED\nvarying vec3 vNormal;\n#endif\n",
        LIGHTS_PARS,
        COLOR_PARS_FRAGMENT,
        UV_PARS_FRAGMENT,
        MAP_PARS_FRAGMENT,
        ALPHAMAP_PARS_FRAGMENT,
        LIGHTMAP_PARS_FRAGMENT,
        EMISSIVEMAP_PARS_FRAGMENT,
        ENVMAP_PARS_FRAGMENT,
        FOG_PARS_FRAGMENT,
        SHADOWMAP_PARS_FRAGMENT,
        BUMPMAP_PARS_FRAGMENT,
        NORMALMAP_PARS_FRAGMENT,
        SPECULARMAP_PARS_FRAGMENT,
        "void main() {\n\
         \tvec3 outgoingLight = vec3( 0.0 );\n\
         \tvec4 diffuseColor = vec4( diffuse, opacity );\n",
        MAP_FRAGMENT,
        COLOR_FRAGMENT,
        ALPHAMAP_FRAGMENT,
        ALPHATEST_FRAGMENT,
        SPECULARMAP_FRAGMENT,
        EMISSIVEMAP_FRAGMENT,
        LIGHTS_PHONG_FRAGMENT,
        LIGHTMAP_FRAGMENT,
        ENVMAP_FRAGMENT,
        SHADOWMAP_FRAGMENT,
        LINEAR_TO_GAMMA_FRAGMENT,
        FOG_FRAGMENT,
        "\tgl_FragColor = vec4( outgoingLight, diffuseColor.a );\n}\n",
    ]);
    (vertex, fragment)
}

fn line_basic() -> (String, String) {
    let vertex = join(&[
        COLOR_PARS_VERTEX,
        LOGDEPTHBUF_PARS_VERTEX,
        "void main() {\n",
        COLOR_VERTEX,
        "\tvec4 mvPosition = modelViewMatrix * vec4( position, 1.0 );\n\
         \tgl_Position = projectionMatrix * mvPosition;\n",
        LOGDEPTHBUF_VERTEX,
        "}\n",
    ]);
    let fragment = join(&[
        COMMON,
        "uniform vec3 diffuse;\nuniform float opacity;\n",
        COLOR_PARS_FRAGMENT,
        FOG_PARS_FRAGMENT,
        "void main() {\n\
         \tvec3 outgoingLight = vec3( 0.0 );\n\
         \tvec4 diffuseColor = vec4( diffuse, opacity );\n",
        COLOR_FRAGMENT,
        "\toutgoingLight = diffuseColor.rgb;\n",
        FOG_FRAGMENT,
        "\tgl_FragColor = vec4( outgoingLight, diffuseColor.a );\n}\n",
    ]);
    (vertex, fragment)
}

fn line_dashed() -> (String, String) {
    let vertex = join(&[
        "uniform float scale;\nattribute float lineDistance;\nvarying float vLineDistance;\n",
        COLOR_PARS_VERTEX,
        LOGDEPTHBUF_PARS_VERTEX,
        "void main() {\n",
        COLOR_VERTEX,
        "\tvLineDistance = scale * lineDistance;\n\
         \tvec4 mvPosition = modelViewMatrix * vec4( position, 1.0 );\n\
         \tgl_Position = projectionMatrix * mvPosition;\n",
        LOGDEPTHBUF_VERTEX,
        "}\n",
    ]);
    let fragment = join(&[
        COMMON,
        "uniform vec3 diffuse;\nuniform float opacity;\nuniform float dashSize;\n\
         uniform float totalSize;\nvarying float vLineDistance;\n",
        COLOR_PARS_FRAGMENT,
        FOG_PARS_FRAGMENT,
        "void main() {\n\
         \tif ( mod( vLineDistance, totalSize ) > dashSize ) {\n\
         \t\tdiscard;\n\
         \t}\n\
         \tvec3 outgoingLight = vec3( 0.0 );\n\
         \tvec4 diffuseColor = vec4( diffuse, opacity );\n",
        COLOR_FRAGMENT,
        "\toutgoingLight = diffuseColor.rgb;\n",
        FOG_FRAGMENT,
        "\tgl_FragColor = vec4( outgoingLight, diffuseColor.a );\n}\n",
    ]);
    (vertex, fragment)
}

fn points() -> (String, String) {
    let vertex = join(&[
        "uniform float size;\nuniform float scale;\n",
        COLOR_PARS_VERTEX,
        SHADOWMAP_PARS_VERTEX,
        LOGDEPTHBUF_PARS_VERTEX,
        "void main() {\n",
        COLOR_VERTEX,
        "\tvec4 mvPosition = modelViewMatrix * vec4( position, 1.0 );\n\
         #ifdef USE_SIZEATTENUATION\n\
         \tgl_PointSize = size * ( scale / length( mvPosition.xyz ) );\n\
         #else\n\
         \tgl_PointSize = size;\n\
         #endif\n\
         \tgl_Position = projectionMatrix * mvPosition;\n",
        LOGDEPTHBUF_VERTEX,
        "\tvec4 worldPosition = modelMatrix * vec4( position, 1.0 );\n",
        SHADOWMAP_VERTEX,
        "}\n",
    ]);
    let fragment = join(&[
        COMMON,
        "uniform vec3 psColor;\nuniform float opacity;\n",
        "#ifdef USE_MAP\nuniform vec4 offsetRepeat;\n#endif\n",
        COLOR_PARS_FRAGMENT,
        MAP_PARS_FRAGMENT,
        FOG_PARS_FRAGMENT,
        SHADOWMAP_PARS_FRAGMENT,
        "void main() {\n\
         \tvec3 outgoingLight = vec3( 0.0 );\n\
         \tvec4 diffuseColor = vec4( psColor, opacity );\n\
         #ifdef USE_MAP\n\
         \tdiffuseColor *= texture2D( map, vec2( gl_PointCoord.x, 1.0 - gl_PointCoord.y ) * offsetRepeat.zw + offsetRepeat.xy );\n\
         #endif\n",
        ALPHATEST_FRAGMENT,
        COLOR_FRAGMENT,
        "\toutgoingLight = diffuseColor.rgb;\n",
        SHADOWMAP_FRAGMENT,
        FOG_FRAGMENT,
        "\tgl_FragColor = vec4( outgoingLight, diffuseColor.a );\n}\n",
    ]);
    (vertex, fragment)
}

fn depth() -> (String, String) {
    let vertex = mesh_vertex("", "");
    let fragment = "\
uniform float mNear;
uniform float mFar;
uniform float opacity;
void main() {
	float depth = gl_FragCoord.z / gl_FragCoord.w;
	float color = 1.0 - smoothstep( mNear, mFar, depth );
	gl_FragColor = vec4( vec3( color ), opacity );
}
"
    .to_string();
    (vertex, fragment)
}

fn normal() -> (String, String) {
    let vertex = mesh_vertex(
        "varying vec3 vNormalView;\n",
        "\tvNormalView = normalize( transformedNormal );\n",
    );
    let fragment = "\
uniform float opacity;
varying vec3 vNormalView;
void main() {
	gl_FragColor = vec4( 0.5 * normalize( vNormalView ) + 0.5, opacity );
}
"
    .to_string();
    (vertex, fragment)
}

/// Vertex and fragment bodies for `kind`, without the prefix.
pub fn sources(kind: &MaterialKind) -> (String, String) {
    match kind {
        MaterialKind::Basic => basic(),
        MaterialKind::Lambert => lambert(),
        MaterialKind::Phong => phong(),
        MaterialKind::LineBasic => line_basic(),
        MaterialKind::LineDashed => line_dashed(),
        MaterialKind::Points => points(),
        MaterialKind::Depth => depth(),
        MaterialKind::Normal => normal(),
        MaterialKind::Shader(shader) => {
            (shader.vertex_shader.clone(), shader.fragment_shader.clone())
        }
    }
}

fn insert(uniforms: &mut Uniforms, entries: Vec<(&str, UniformValue)>) {
    for (name, value) in entries {
        uniforms.insert(name.to_string(), value);
    }
}

fn common_uniforms(uniforms: &mut Uniforms) {
    insert(
        uniforms,
        vec![
            ("diffuse", UniformValue::Vec3(Vec3::ONE)),
            ("opacity", UniformValue::Float(1.0)),
            ("map", UniformValue::Texture(None)),
            ("offsetRepeat", UniformValue::Vec4(Vec4::new(0.0, 0.0, 1.0, 1.0))),
            ("lightMap", UniformValue::Texture(None)),
            ("specularMap", UniformValue::Texture(None)),
            ("alphaMap", UniformValue::Texture(None)),
            ("envMap", UniformValue::Texture(None)),
            ("flipEnvMap", UniformValue::Float(-1.0)),
            ("combine", UniformValue::Int(0)),
            ("reflectivity", UniformValue::Float(1.0)),
            ("refractionRatio", UniformValue::Float(0.98)),
        ],
    );
}

fn fog_uniforms(uniforms: &mut Uniforms) {
    insert(
        uniforms,
        vec![
            ("fogDensity", UniformValue::Float(0.00025)),
            ("fogNear", UniformValue::Float(1.0)),
            ("fogFar", UniformValue::Float(2000.0)),
            ("fogColor", UniformValue::Vec3(Vec3::ONE)),
        ],
    );
}

fn light_uniforms(uniforms: &mut Uniforms) {
    insert(
        uniforms,
        vec![
            ("ambientLightColor", UniformValue::Vec3(Vec3::ZERO)),
            ("directionalLightColor", UniformValue::Vec3Array(Vec::new())),
            ("directionalLightDirection", UniformValue::Vec3Array(Vec::new())),
            ("hemisphereLightSkyColor", UniformValue::Vec3Array(Vec::new())),
            ("hemisphereLightGroundColor", UniformValue::Vec3Array(Vec::new())),
            ("hemisphereLightDirection", UniformValue::Vec3Array(Vec::new())),
            ("pointLightColor", UniformValue::Vec3Array(Vec::new())),
            ("pointLightPosition", UniformValue::Vec3Array(Vec::new())),
            ("pointLightDistance", UniformValue::FloatArray(Vec::new())),
            ("pointLightDecay", UniformValue::FloatArray(Vec::new())),
            ("spotLightColor", UniformValue::Vec3Array(Vec::new())),
            ("spotLightPosition", UniformValue::Vec3Array(Vec::new())),
            ("spotLightDirection", UniformValue::Vec3Array(Vec::new())),
            ("spotLightDistance", UniformValue::FloatArray(Vec::new())),
            ("spotLightAngleCos", UniformValue::FloatArray(Vec::new())),
            ("spotLightExponent", UniformValue::FloatArray(Vec::new())),
            ("spotLightDecay", UniformValue::FloatArray(Vec::new())),
        ],
    );
}

fn shadow_uniforms(uniforms: &mut Uniforms) {
    insert(
        uniforms,
        vec![
            ("shadowMap", UniformValue::RenderTargetArray(Vec::new())),
            ("shadowMapSize", UniformValue::Vec2Array(Vec::new())),
            ("shadowBias", UniformValue::FloatArray(Vec::new())),
            ("shadowDarkness", UniformValue::FloatArray(Vec::new())),
            ("shadowMatrix", UniformValue::Mat4Array(Vec::new())),
        ],
    );
}

/// Uniform map a fresh program for `kind` starts from.
pub fn default_uniforms(kind: &MaterialKind) -> Uniforms {
    let mut uniforms = Uniforms::new();
    match kind {
        MaterialKind::Basic => {
            common_uniforms(&mut uniforms);
            fog_uniforms(&mut uniforms);
            shadow_uniforms(&mut uniforms);
        }
        MaterialKind::Lambert => {
            common_uniforms(&mut uniforms);
            fog_uniforms(&mut uniforms);
            light_uniforms(&mut uniforms);
            shadow_uniforms(&mut uniforms);
            insert(
                &mut uniforms,
                vec![
                    ("emissive", UniformValue::Vec3(Vec3::ZERO)),
                    ("emissiveMap", UniformValue::Texture(None)),
                ],
            );
        }
        MaterialKind::Phong => {
            common_uniforms(&mut uniforms);
            fog_uniforms(&mut uniforms);
            light_uniforms(&mut uniforms);
            shadow_uniforms(&mut uniforms);
            insert(
                &mut uniforms,
                vec![
                    ("emissive", UniformValue::Vec3(Vec3::ZERO)),
                    ("emissiveMap", UniformValue::Texture(None)),
                    ("specular", UniformValue::Vec3(Vec3::splat(0.067))),
                    ("shininess", UniformValue::Float(30.0)),
                    ("bumpMap", UniformValue::Texture(None)),
                    ("bumpScale", UniformValue::Float(1.0)),
                    ("normalMap", UniformValue::Texture(None)),
                    ("normalScale", UniformValue::Vec2(Vec2::ONE)),
                ],
            );
        }
        MaterialKind::LineBasic => {
            insert(
                &mut uniforms,
                vec![
                    ("diffuse", UniformValue::Vec3(Vec3::ONE)),
                    ("opacity", UniformValue::Float(1.0)),
                ],
            );
            fog_uniforms(&mut uniforms);
        }
        MaterialKind::LineDashed => {
            insert(
                &mut uniforms,
                vec![
                    ("diffuse", UniformValue::Vec3(Vec3::ONE)),
                    ("opacity", UniformValue::Float(1.0)),
                    ("scale", UniformValue::Float(1.0)),
                    ("dashSize", UniformValue::Float(1.0)),
                    ("totalSize", UniformValue::Float(2.0)),
                ],
            );
            fog_uniforms(&mut uniforms);
        }
        MaterialKind::Points => {
            insert(
                &mut uniforms,
                vec![
                    ("psColor", UniformValue::Vec3(Vec3::ONE)),
                    ("opacity", UniformValue::Float(1.0)),
                    ("size", UniformValue::Float(1.0)),
                    ("scale", UniformValue::Float(1.0)),
                    ("map", UniformValue::Texture(None)),
                    ("offsetRepeat", UniformValue::Vec4(Vec4::new(0.0, 0.0, 1.0, 1.0))),
                ],
            );
            fog_uniforms(&mut uniforms);
            shadow_uniforms(&mut uniforms);
        }
        MaterialKind::Depth => {
            insert(
                &mut uniforms,
                vec![
                    ("mNear", UniformValue::Float(1.0)),
                    ("mFar", UniformValue::Float(2000.0)),
                    ("opacity", UniformValue::Float(1.0)),
                ],
            );
        }
        MaterialKind::Normal => {
            uniforms.insert("opacity".to_string(), UniformValue::Float(1.0));
        }
        MaterialKind::Shader(shader) => {
            uniforms = shader.uniforms.clone();
            let features = kind.features();
            if features.contains(MaterialFeatures::LIGHTS) {
                light_uniforms(&mut uniforms);
            }
            if features.contains(MaterialFeatures::FOG) {
                fog_uniforms(&mut uniforms);
            }
        }
    }
    uniforms
}

/// Packs fragment depth into RGBA8. Shadow maps render casters with it.
pub fn depth_rgba() -> ShaderMaterial {
    let vertex = mesh_vertex("", "");
    let fragment = "\
vec4 pack_depth( const in float depth ) {
	const vec4 bit_shift = vec4( 256.0 * 256.0 * 256.0, 256.0 * 256.0, 256.0, 1.0 );
	const vec4 bit_mask = vec4( 0.0, 1.0 / 256.0, 1.0 / 256.0, 1.0 / 256.0 );
	vec4 res = mod( depth * bit_shift * vec4( 255 ), vec4( 256 ) ) / vec4( 255 );
	res -= res.xxyz * bit_mask;
	return res;
}
void main() {
	gl_FragData[ 0 ] = pack_depth( gl_FragCoord.z );
}
"
    .to_string();
    ShaderMaterial {
        vertex_shader: vertex,
        fragment_shader: fragment,
        ..ShaderMaterial::default()
    }
}
